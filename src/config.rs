use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the workflow coordinators.
///
/// Hosts construct one per machine instance; the defaults match the
/// production Green Goods flows (three retries, two-minute confirmation
/// window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound on explicit retry attempts after a step failure
    pub max_retry_attempts: u8,
    /// Upper bound on the transaction confirmation poll, in seconds
    pub confirmation_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            confirmation_timeout_secs: 120,
        }
    }
}

impl WorkflowConfig {
    pub fn confirmation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.confirmation_timeout_secs)
    }
}
