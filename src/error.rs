//! Error types for the FretCoach application
//!
//! Two layers: `GatewayError` for the remote-model boundary, and `CoachError`
//! for everything the rest of the application can surface.

use thiserror::Error;

/// Billable operations subject to the free-tier quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billable {
    /// A recording submitted for analysis
    Recording,
    /// A generated lesson
    Lesson,
}

impl std::fmt::Display for Billable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Billable::Recording => write!(f, "recordings"),
            Billable::Lesson => write!(f, "generated lessons"),
        }
    }
}

/// Failures at the hosted-model boundary
///
/// The gateway is an opaque external service; every way it can let us down
/// gets its own variant so the orchestrator can route the user correctly.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Request never completed (DNS, connect, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success HTTP status
    #[error("gateway returned HTTP {0}")]
    Status(u16),

    /// Service answered, but with no usable content
    #[error("empty response from model")]
    EmptyResponse,

    /// Content did not match the declared response contract
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The long-running operation's entity could not be found; in practice a
    /// credential/entitlement problem, not a transient failure
    #[error("requested entity was not found")]
    EntityNotFound,

    /// Long-running operation still pending after the poll budget ran out
    #[error("operation did not complete after {0} polls")]
    PollTimeout(u32),

    /// Long-running operation completed with a service-reported failure
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Long-running operation abandoned by an explicit cancel (shutdown)
    #[error("operation cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Whether this failure means the credential needs to be re-selected
    /// rather than the request retried.
    pub fn is_credential_problem(&self) -> bool {
        matches!(self, GatewayError::EntityNotFound)
    }
}

/// Illegal state-machine transition
///
/// Produced when a session event arrives in a state that has no transition
/// for it. Illegal transitions are explicit errors, never silent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event `{event}` is not legal in state {state}")]
pub struct TransitionError {
    /// State the session was in when the event arrived
    pub state: &'static str,
    /// Name of the offending event
    pub event: &'static str,
}

/// FretCoach application errors
#[derive(Error, Debug, Clone)]
pub enum CoachError {
    /// Microphone permission denied, no hardware, or stream setup failure
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Free-tier ceiling reached for a billable operation; pre-flight
    /// refusal, not a gateway failure
    #[error("free-tier limit reached for {0}")]
    QuotaExceeded(Billable),

    /// Remote analysis or generation failed
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Session state machine refused an event
    #[error("session error: {0}")]
    Transition(#[from] TransitionError),

    /// Local audio decode/encode failure
    #[error("audio processing error: {0}")]
    AudioProcessing(String),

    /// Channel communication error
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoachError {
    /// Check if this error is recoverable without restarting the application.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/permission problems need user intervention
            CoachError::DeviceUnavailable(_) => false,
            // Quota refusal resolves through the upgrade surface
            CoachError::QuotaExceeded(_) => true,
            // Credential problems need a new key; everything else can be
            // retried by discarding and re-recording
            CoachError::Gateway(e) => !e.is_credential_problem(),
            // A refused transition leaves state untouched
            CoachError::Transition(_) => true,
            CoachError::AudioProcessing(_) => true,
            // Channel errors indicate internal wiring is gone
            CoachError::Channel(_) => false,
            CoachError::Config(_) => false,
        }
    }

    /// Get a user-facing description of the error, suitable for the UI.
    pub fn user_message(&self) -> String {
        match self {
            CoachError::DeviceUnavailable(_) => {
                "Unable to access the microphone. Check that permission is granted and a device is connected.".to_string()
            }
            CoachError::QuotaExceeded(op) => {
                format!("You have reached the free limit for {op}. Upgrade to Premium to continue.")
            }
            CoachError::Gateway(GatewayError::EntityNotFound) => {
                "Video generation requires a paid API key. The current key is invalid or lacks permissions. Select a new key.".to_string()
            }
            CoachError::Gateway(GatewayError::PollTimeout(_)) => {
                "The video is taking too long to generate. Please try again later.".to_string()
            }
            CoachError::Gateway(_) => {
                "The AI service could not process the request. Please try again.".to_string()
            }
            CoachError::Transition(_) => {
                "That action is not available right now.".to_string()
            }
            CoachError::AudioProcessing(_) => {
                "Audio processing failed. Please record again.".to_string()
            }
            CoachError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CoachError::Config(_) => {
                "Configuration error. Check that GEMINI_API_KEY is set.".to_string()
            }
        }
    }
}

/// Result type alias for FretCoach operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_are_recoverable_except_credentials() {
        assert!(CoachError::Gateway(GatewayError::Network("down".into())).is_recoverable());
        assert!(CoachError::Gateway(GatewayError::EmptyResponse).is_recoverable());
        assert!(!CoachError::Gateway(GatewayError::EntityNotFound).is_recoverable());
    }

    #[test]
    fn entity_not_found_is_a_credential_problem() {
        assert!(GatewayError::EntityNotFound.is_credential_problem());
        assert!(!GatewayError::Status(500).is_credential_problem());
        assert!(!GatewayError::PollTimeout(60).is_credential_problem());
    }

    #[test]
    fn quota_message_names_the_operation() {
        let msg = CoachError::QuotaExceeded(Billable::Recording).user_message();
        assert!(msg.contains("recordings"));
        let msg = CoachError::QuotaExceeded(Billable::Lesson).user_message();
        assert!(msg.contains("lessons"));
    }

    #[test]
    fn transition_error_names_state_and_event() {
        let err = TransitionError {
            state: "Idle",
            event: "ScoreReceived",
        };
        let text = err.to_string();
        assert!(text.contains("Idle"));
        assert!(text.contains("ScoreReceived"));
    }
}
