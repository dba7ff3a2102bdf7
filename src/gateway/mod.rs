//! Hosted-model gateway boundary
//!
//! Three remote collaborators sit behind this module: audio analysis, lesson
//! generation, and video generation. Each is an opaque request/response
//! service; everything it can do wrong is mapped onto `GatewayError` so the
//! orchestrator can route the user without inspecting wire details.
//!
//! The traits are the seams: workers hold `Arc<dyn AnalysisBackend>` /
//! `Arc<dyn GenerationBackend>`, which is what lets the integration tests run
//! the full pipeline against canned backends.

pub mod analysis;
pub mod lesson;
pub mod prompts;
pub mod video;

pub use analysis::AnalysisGateway;
pub use lesson::LessonGateway;
pub use video::VideoGateway;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::lessons::LessonRecord;
use crate::state::AnalysisResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Audio-scoring collaborator
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Score an encoded audio payload
    ///
    /// `audio_b64` is the transfer encoding of the finalized blob;
    /// `media_type` its declared tag.
    async fn analyze(
        &self,
        audio_b64: &str,
        media_type: &str,
    ) -> Result<AnalysisResult, GatewayError>;
}

/// Lesson/video generation collaborator
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a complete lesson for the given level and topic
    async fn generate_lesson(
        &self,
        level: &str,
        topic: &str,
    ) -> Result<LessonRecord, GatewayError>;

    /// Generate a demonstration video; long-running with bounded polling
    ///
    /// `cancel` aborts the poll loop between attempts (used on shutdown).
    async fn generate_video(
        &self,
        title: &str,
        description: &str,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, GatewayError>;
}

/// Production generation backend: lesson + video gateways behind one trait
pub struct GenerationGateway {
    lessons: LessonGateway,
    videos: VideoGateway,
}

impl GenerationGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            lessons: LessonGateway::new(config.clone())?,
            videos: VideoGateway::new(config)?,
        })
    }
}

#[async_trait]
impl GenerationBackend for GenerationGateway {
    async fn generate_lesson(
        &self,
        level: &str,
        topic: &str,
    ) -> Result<LessonRecord, GatewayError> {
        self.lessons.generate(level, topic).await
    }

    async fn generate_video(
        &self,
        title: &str,
        description: &str,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, GatewayError> {
        self.videos.generate(title, description, cancel).await
    }
}

// === Shared wire plumbing ===

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Build the shared HTTP client with the configured per-request timeout
pub(crate) fn build_client(config: &GatewayConfig) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| GatewayError::Network(e.to_string()))
}

/// URL of a `generateContent` call for the given model
pub(crate) fn generate_content_url(config: &GatewayConfig, model: &str) -> String {
    format!("{}/v1beta/models/{}:generateContent", config.base_url, model)
}

/// Issue a `generateContent` request and return the model's text payload
pub(crate) async fn post_generate_content(
    client: &reqwest::Client,
    config: &GatewayConfig,
    model: &str,
    body: serde_json::Value,
) -> Result<String, GatewayError> {
    let response = client
        .post(generate_content_url(config, model))
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status.as_u16()));
    }

    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;
    extract_content_text(&text)
}

/// Dig the generated text out of a `generateContent` response body
///
/// A well-formed envelope with nothing inside is `EmptyResponse`; an envelope
/// that does not parse is `MalformedResponse`.
pub(crate) fn extract_content_text(body: &str) -> Result<String, GatewayError> {
    let envelope: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("response envelope: {e}")))?;

    let text = envelope
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.content)
        .filter_map(|c| c.parts)
        .flatten()
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty());

    text.ok_or(GatewayError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_nonempty_text_part() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": ""}, {"text": "hello"}]}}
            ]
        }"#;
        assert_eq!(extract_content_text(body).unwrap(), "hello");
    }

    #[test]
    fn missing_candidates_is_an_empty_response() {
        assert!(matches!(
            extract_content_text("{}"),
            Err(GatewayError::EmptyResponse)
        ));
        assert!(matches!(
            extract_content_text(r#"{"candidates": []}"#),
            Err(GatewayError::EmptyResponse)
        ));
    }

    #[test]
    fn unparseable_envelope_is_malformed() {
        assert!(matches!(
            extract_content_text("not json at all"),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn url_includes_the_model() {
        let config = GatewayConfig::new("k").with_base_url("http://host");
        assert_eq!(
            generate_content_url(&config, "gemini-2.5-flash"),
            "http://host/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
