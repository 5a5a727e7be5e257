use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::error::StepError;

/// A restored or freshly established passkey session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeySession {
    pub credential_id: String,
    pub smart_account_address: String,
    pub user_name: String,
}

/// Host-supplied executors for the authentication steps.
///
/// Implementations own the WebAuthn ceremony, smart-account derivation, and
/// ENS registration calls.
#[async_trait]
pub trait AuthStepExecutor: Send + Sync {
    /// One-shot silent session restore at startup. `Ok(None)` and `Err` are
    /// treated identically by the workflow (no session, no user-visible
    /// error).
    async fn restore_session(&self) -> Result<Option<PasskeySession>, StepError>;

    async fn register_passkey(&self, user_name: &str) -> Result<PasskeySession, StepError>;

    async fn authenticate_passkey(&self, user_name: &str) -> Result<PasskeySession, StepError>;

    async fn claim_ens(&self, name: &str) -> Result<(), StepError>;
}
