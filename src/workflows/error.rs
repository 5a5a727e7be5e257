use thiserror::Error;

/// Fallback message when a step failure cannot be rendered at all
const GENERIC_STEP_FAILURE: &str = "Workflow step failed with an unreportable error";

/// Failure raised by a host-supplied step executor.
///
/// The machines do not classify failures beyond this; whatever shape the
/// executor raises is normalized to a plain string stored in the workflow
/// context, and any recoverable/fatal classification is left to the
/// presentation layer reading that string.
#[derive(Debug, Error)]
pub enum StepError {
    /// A plain message, stored as-is
    #[error("{0}")]
    Message(String),
    /// An underlying error value, rendered through its Display impl
    #[error("{0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),
    /// Structured data, rendered as compact JSON
    #[error("{}", normalize_payload(.0))]
    Payload(serde_json::Value),
}

impl StepError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn source(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(error))
    }

    pub fn payload(value: serde_json::Value) -> Self {
        Self::Payload(value)
    }

    /// Normalize to the string stored in `context.error`
    pub fn normalize(&self) -> String {
        match self {
            Self::Message(message) => message.clone(),
            Self::Source(error) => error.to_string(),
            Self::Payload(value) => normalize_payload(value),
        }
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

fn normalize_payload(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| GENERIC_STEP_FAILURE.to_string())
}

/// Hard workflow errors surfaced to the caller instead of entering a failed
/// state. These indicate a broken precondition, not a failed step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Missing artifact for step {step}: {artifact}")]
    MissingArtifact {
        step: &'static str,
        artifact: &'static str,
    },
}
