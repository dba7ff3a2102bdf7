//! Remote video generation
//!
//! Video generation is a long-running operation: one call starts it, then the
//! operation is polled until done. The poll loop is explicitly bounded
//! (interval and max attempts) and cancellable between attempts, so a stuck
//! operation becomes `PollTimeout` instead of an infinite spin.
//!
//! A 404 / "Requested entity was not found" failure is classified as
//! `EntityNotFound`: in practice it means the credential lacks the video
//! entitlement, which warrants a re-authenticate prompt rather than a retry.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::prompts;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const ENTITY_NOT_FOUND_MARKER: &str = "Requested entity was not found";

/// Video-generation gateway
pub struct VideoGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

/// One poll's verdict on a running operation
#[derive(Debug, PartialEq)]
pub(crate) enum PollOutcome {
    /// Still running
    Pending,
    /// Finished; playable media reference
    Ready(String),
}

#[derive(Debug, Deserialize)]
struct OperationEnvelope {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    code: Option<i64>,
    message: Option<String>,
}

impl VideoGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: super::build_client(&config)?,
            config,
        })
    }

    /// Generate a demonstration video and return its media reference
    ///
    /// `cancel` is checked between poll attempts; setting it abandons the
    /// operation with `Cancelled`.
    pub async fn generate(
        &self,
        title: &str,
        description: &str,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, GatewayError> {
        let operation = self.start_operation(title, description).await?;
        info!("Video operation started: {}", operation);

        let policy = &self.config.video_poll;
        for attempt in 1..=policy.max_attempts {
            tokio::time::sleep(policy.interval).await;

            if cancel.load(Ordering::SeqCst) {
                return Err(GatewayError::Cancelled);
            }

            match self.poll_operation(&operation).await? {
                PollOutcome::Ready(uri) => {
                    info!("Video ready after {} poll(s)", attempt);
                    return Ok(uri);
                }
                PollOutcome::Pending => {
                    debug!("Video pending ({}/{})", attempt, policy.max_attempts);
                }
            }
        }

        Err(GatewayError::PollTimeout(policy.max_attempts))
    }

    async fn start_operation(
        &self,
        title: &str,
        description: &str,
    ) -> Result<String, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.config.base_url, self.config.video_model
        );
        let body = json!({
            "instances": [{ "prompt": prompts::video_prompt(title, description) }],
            "parameters": {
                "sampleCount": 1,
                "resolution": "720p",
                "aspectRatio": "16:9",
            }
        });

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        if status == 404 {
            return Err(GatewayError::EntityNotFound);
        }
        if !(200..300).contains(&status) {
            return Err(GatewayError::Status(status));
        }

        parse_start(&text)
    }

    async fn poll_operation(&self, operation: &str) -> Result<PollOutcome, GatewayError> {
        let url = format!("{}/v1beta/{}", self.config.base_url, operation);

        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        if status == 404 {
            return Err(GatewayError::EntityNotFound);
        }
        if !(200..300).contains(&status) {
            return Err(GatewayError::Status(status));
        }

        parse_poll(&text)
    }
}

/// Extract the operation name from the start response
pub(crate) fn parse_start(body: &str) -> Result<String, GatewayError> {
    let envelope: OperationEnvelope = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("operation envelope: {e}")))?;

    envelope
        .name
        .filter(|n| !n.is_empty())
        .ok_or(GatewayError::EmptyResponse)
}

/// Interpret one poll response
pub(crate) fn parse_poll(body: &str) -> Result<PollOutcome, GatewayError> {
    let envelope: OperationEnvelope = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("operation envelope: {e}")))?;

    if let Some(error) = envelope.error {
        return Err(classify_operation_error(error));
    }

    if !envelope.done {
        return Ok(PollOutcome::Pending);
    }

    let uri = envelope
        .response
        .as_ref()
        .and_then(extract_video_uri)
        .ok_or(GatewayError::EmptyResponse)?;
    Ok(PollOutcome::Ready(uri))
}

fn classify_operation_error(error: OperationError) -> GatewayError {
    let message = error.message.unwrap_or_default();
    if error.code == Some(404) || message.contains(ENTITY_NOT_FOUND_MARKER) {
        GatewayError::EntityNotFound
    } else {
        GatewayError::OperationFailed(message)
    }
}

fn extract_video_uri(response: &serde_json::Value) -> Option<String> {
    response
        .get("generateVideoResponse")?
        .get("generatedSamples")?
        .get(0)?
        .get("video")?
        .get("uri")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_response_yields_the_operation_name() {
        let body = r#"{"name": "models/veo/operations/abc123"}"#;
        assert_eq!(parse_start(body).unwrap(), "models/veo/operations/abc123");
    }

    #[test]
    fn start_without_a_name_is_empty() {
        assert!(matches!(
            parse_start("{}"),
            Err(GatewayError::EmptyResponse)
        ));
    }

    #[test]
    fn pending_operation_keeps_polling() {
        let body = r#"{"name": "op", "done": false}"#;
        assert_eq!(parse_poll(body).unwrap(), PollOutcome::Pending);
        // `done` omitted entirely also means pending
        let body = r#"{"name": "op"}"#;
        assert_eq!(parse_poll(body).unwrap(), PollOutcome::Pending);
    }

    #[test]
    fn finished_operation_yields_the_uri() {
        let body = r#"{
            "name": "op", "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://media/video.mp4"}}]
                }
            }
        }"#;
        assert_eq!(
            parse_poll(body).unwrap(),
            PollOutcome::Ready("https://media/video.mp4".into())
        );
    }

    #[test]
    fn finished_without_a_uri_is_empty() {
        let body = r#"{"name": "op", "done": true, "response": {}}"#;
        assert!(matches!(
            parse_poll(body),
            Err(GatewayError::EmptyResponse)
        ));
    }

    #[test]
    fn entity_not_found_is_classified_by_code_or_message() {
        let body = r#"{"name": "op", "done": true, "error": {"code": 404, "message": "nope"}}"#;
        assert!(matches!(
            parse_poll(body),
            Err(GatewayError::EntityNotFound)
        ));

        let body = r#"{
            "name": "op", "done": true,
            "error": {"code": 5, "message": "Requested entity was not found."}
        }"#;
        assert!(matches!(
            parse_poll(body),
            Err(GatewayError::EntityNotFound)
        ));
    }

    #[test]
    fn other_operation_errors_stay_generic() {
        let body = r#"{"name": "op", "done": true, "error": {"code": 13, "message": "internal"}}"#;
        match parse_poll(body) {
            Err(GatewayError::OperationFailed(msg)) => assert_eq!(msg, "internal"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
