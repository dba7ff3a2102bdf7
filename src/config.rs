//! Gateway configuration
//!
//! All remote-model calls share one configuration: the access credential
//! (required at process start), the endpoint, the model identifiers, and the
//! polling policy for long-running video generation.

use crate::error::{CoachError, Result};
use std::time::Duration;

/// Environment variable holding the gateway access credential
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default gateway endpoint
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Polling policy for long-running operations
///
/// The repeating poll task is explicitly bounded: it gives up with a timeout
/// error after `max_attempts` polls rather than spinning on a stuck operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive polls
    pub interval: Duration,
    /// Maximum number of polls before giving up
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Configuration for the hosted-model gateways
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Access credential for all gateway calls
    pub api_key: String,
    /// Gateway endpoint base URL (no trailing slash)
    pub base_url: String,
    /// Model used for audio analysis
    pub analysis_model: String,
    /// Model used for lesson generation
    pub lesson_model: String,
    /// Model used for video generation
    pub video_model: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Polling policy for video operations
    pub video_poll: PollPolicy,
}

impl GatewayConfig {
    /// Create a configuration with the given credential and default models
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            analysis_model: "gemini-2.5-flash".to_string(),
            lesson_model: "gemini-2.5-flash".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            request_timeout: Duration::from_secs(60),
            video_poll: PollPolicy::default(),
        }
    }

    /// Build the configuration from the environment
    ///
    /// # Errors
    /// Returns a configuration error if the credential variable is unset or
    /// empty. The credential is required at process start; there is no
    /// anonymous mode.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CoachError::Config(format!("{API_KEY_VAR} must be set to a gateway API key"))
            })?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        Ok(config)
    }

    /// Set the endpoint base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the analysis model
    pub fn with_analysis_model(mut self, model: impl Into<String>) -> Self {
        self.analysis_model = model.into();
        self
    }

    /// Set the lesson model
    pub fn with_lesson_model(mut self, model: impl Into<String>) -> Self {
        self.lesson_model = model.into();
        self
    }

    /// Set the video model
    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = model.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the video polling policy
    pub fn with_video_poll(mut self, poll: PollPolicy) -> Self {
        self.video_poll = poll;
        self
    }
}
