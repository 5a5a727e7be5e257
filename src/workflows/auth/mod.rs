//! Authentication workflow
//!
//! Branches between passkey registration, passkey authentication, wallet
//! connection, and silent session restore, with an ENS claim sub-flow for
//! passkey sessions. Restore failures are swallowed; login failures are
//! retryable up to the configured bound, after which retry routes back to the
//! sign-in selection.

pub mod coordinator;
pub mod machine;
pub mod steps;

pub use coordinator::{AuthCoordinator, AuthStatusReport};
pub use machine::{AuthContext, AuthEvent, AuthState, AuthStep, AuthWorkflowMachine, LoginMethod};
pub use steps::{AuthStepExecutor, PasskeySession};
