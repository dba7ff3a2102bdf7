//! Remote lesson generation
//!
//! Text-only `generateContent` call with a pinned JSON schema; the reply is a
//! complete lesson record, validated against the generation contract before
//! it is allowed into the catalog.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{post_generate_content, prompts};
use crate::lessons::LessonRecord;
use serde_json::json;
use tracing::debug;

/// Lesson-generation gateway
pub struct LessonGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl LessonGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: super::build_client(&config)?,
            config,
        })
    }

    /// Generate a complete lesson for the given level and topic
    pub async fn generate(&self, level: &str, topic: &str) -> Result<LessonRecord, GatewayError> {
        debug!("Generating lesson: level={}, topic={}", level, topic);

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompts::lesson_prompt(level, topic) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "difficulty": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "theory": { "type": "STRING" },
                        "lessonSteps": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                        },
                        "tablature": { "type": "STRING" },
                    },
                    "required": [
                        "title", "difficulty", "description",
                        "theory", "lessonSteps", "tablature",
                    ],
                }
            }
        });

        let text =
            post_generate_content(&self.client, &self.config, &self.config.lesson_model, body)
                .await?;
        parse_lesson(&text)
    }
}

/// Parse and contract-check the model's JSON payload
pub(crate) fn parse_lesson(text: &str) -> Result<LessonRecord, GatewayError> {
    let record: LessonRecord = serde_json::from_str(text)
        .map_err(|e| GatewayError::MalformedResponse(format!("lesson payload: {e}")))?;

    if let Some(violation) = record.contract_violation() {
        return Err(GatewayError::MalformedResponse(violation));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(steps: &str, tab: &str) -> String {
        format!(
            r#"{{
                "title": "Funk Comping 101",
                "difficulty": "Intermediate",
                "description": "Sixteenth-note strumming control",
                "theory": "Funk lives on muted ghost strokes.",
                "lessonSteps": {steps},
                "tablature": "{tab}"
            }}"#
        )
    }

    const SIX_LINE_TAB: &str =
        "e|---|\\nB|---|\\nG|---|\\nD|---|\\nA|---|\\nE|---|";

    #[test]
    fn well_formed_lesson_parses() {
        let text = payload(r#"["mute", "strum", "accent"]"#, SIX_LINE_TAB);
        let record = parse_lesson(&text).unwrap();
        assert_eq!(record.title, "Funk Comping 101");
        assert_eq!(record.lesson_steps.len(), 3);
    }

    #[test]
    fn too_few_steps_is_malformed() {
        let text = payload(r#"["just one", "and two"]"#, SIX_LINE_TAB);
        assert!(matches!(
            parse_lesson(&text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn wrong_tablature_height_is_malformed() {
        let text = payload(r#"["a", "b", "c"]"#, "e|---|\\nB|---|");
        assert!(matches!(
            parse_lesson(&text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unknown_difficulty_is_malformed() {
        let text = r#"{
            "title": "t", "difficulty": "Impossible", "description": "d",
            "theory": "th", "lessonSteps": ["a","b","c"],
            "tablature": "1\n2\n3\n4\n5\n6"
        }"#;
        assert!(matches!(
            parse_lesson(text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }
}
