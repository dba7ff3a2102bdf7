//! Remote audio analysis
//!
//! Sends the encoded recording inline with a grading prompt and a pinned
//! JSON response schema; the reply is the four-field analysis record.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{post_generate_content, prompts, AnalysisBackend};
use crate::state::AnalysisResult;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Audio-scoring gateway
pub struct AnalysisGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl AnalysisGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: super::build_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisGateway {
    async fn analyze(
        &self,
        audio_b64: &str,
        media_type: &str,
    ) -> Result<AnalysisResult, GatewayError> {
        debug!(
            "Submitting {} base64 bytes ({}) for analysis",
            audio_b64.len(),
            media_type
        );

        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": media_type,
                            "data": audio_b64,
                        }
                    },
                    { "text": prompts::ANALYSIS_PROMPT },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "score": { "type": "NUMBER" },
                        "feedback": { "type": "STRING" },
                        "technicalAdvice": { "type": "STRING" },
                        "theoryTip": { "type": "STRING" },
                    },
                    "required": ["score", "feedback", "technicalAdvice", "theoryTip"],
                }
            }
        });

        let text =
            post_generate_content(&self.client, &self.config, &self.config.analysis_model, body)
                .await?;
        parse_analysis(&text)
    }
}

/// Parse and validate the model's JSON payload
///
/// The score is part of the contract: anything outside 0..=10 is a broken
/// response, not a grade.
pub(crate) fn parse_analysis(text: &str) -> Result<AnalysisResult, GatewayError> {
    let result: AnalysisResult = serde_json::from_str(text)
        .map_err(|e| GatewayError::MalformedResponse(format!("analysis payload: {e}")))?;

    if !(0.0..=10.0).contains(&result.score) {
        return Err(GatewayError::MalformedResponse(format!(
            "score {} out of range",
            result.score
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_payload_parses() {
        let text = r#"{
            "score": 8,
            "feedback": "Solid rhythm",
            "technicalAdvice": "Lighter grip",
            "theoryTip": "That was a mixolydian run"
        }"#;
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.score, 8.0);
        assert_eq!(result.display_score(), "8/10");
        assert_eq!(result.technical_advice, "Lighter grip");
    }

    #[test]
    fn out_of_range_score_is_malformed() {
        let text = r#"{"score": 11, "feedback": "", "technicalAdvice": "", "theoryTip": ""}"#;
        assert!(matches!(
            parse_analysis(text),
            Err(GatewayError::MalformedResponse(_))
        ));

        let text = r#"{"score": -0.5, "feedback": "", "technicalAdvice": "", "theoryTip": ""}"#;
        assert!(matches!(
            parse_analysis(text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn boundary_scores_are_legal() {
        for score in ["0", "10"] {
            let text = format!(
                r#"{{"score": {score}, "feedback": "f", "technicalAdvice": "t", "theoryTip": "y"}}"#
            );
            assert!(parse_analysis(&text).is_ok());
        }
    }

    #[test]
    fn missing_fields_are_malformed() {
        let text = r#"{"score": 5}"#;
        assert!(matches!(
            parse_analysis(text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }
}
