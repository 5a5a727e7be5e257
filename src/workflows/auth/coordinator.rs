use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::machine::{AuthContext, AuthEvent, AuthState, AuthStep, AuthWorkflowMachine};
use super::steps::AuthStepExecutor;
use crate::config::WorkflowConfig;
use crate::workflows::error::WorkflowError;
use crate::workflows::Generation;

/// Binds the auth machine to its host-supplied step executors.
///
/// `initialize` must be called once after construction to run the silent
/// session restore. Login and claim operations drive the machine until it
/// settles; sign-out supersedes any outstanding step.
pub struct AuthCoordinator {
    machine: Arc<RwLock<AuthWorkflowMachine>>,
    executor: Arc<dyn AuthStepExecutor>,
    generation: Generation,
}

/// Snapshot of the auth workflow for host status rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatusReport {
    pub state: AuthState,
    pub is_authenticated: bool,
    pub user_name: Option<String>,
    pub error: Option<String>,
    pub retry_count: u8,
}

impl AuthCoordinator {
    pub fn new(executor: Arc<dyn AuthStepExecutor>, config: WorkflowConfig) -> Self {
        let machine = AuthWorkflowMachine::new(config.max_retry_attempts);
        Self {
            machine: Arc::new(RwLock::new(machine)),
            executor,
            generation: Generation::default(),
        }
    }

    /// Run the one-shot session restore the machine starts in
    pub async fn initialize(&self) -> Result<(), WorkflowError> {
        let generation = self.generation.bump();
        self.drive(generation).await
    }

    pub async fn login_passkey_new(&self, user_name: String) -> Result<(), WorkflowError> {
        self.send_and_drive(AuthEvent::LoginPasskeyNew { user_name })
            .await
    }

    pub async fn login_passkey_existing(&self, user_name: String) -> Result<(), WorkflowError> {
        self.send_and_drive(AuthEvent::LoginPasskeyExisting { user_name })
            .await
    }

    pub async fn claim_ens(&self, name: String) -> Result<(), WorkflowError> {
        self.send_and_drive(AuthEvent::ClaimEns { name }).await
    }

    pub async fn retry(&self) -> Result<(), WorkflowError> {
        self.send_and_drive(AuthEvent::Retry).await
    }

    /// Enter wallet connection; the host delivers the wallet events
    pub async fn login_wallet(&self) {
        self.machine.write().await.handle_event(AuthEvent::LoginWallet);
    }

    pub async fn wallet_connected(&self, address: String) {
        self.machine
            .write()
            .await
            .handle_event(AuthEvent::WalletConnected { address });
    }

    pub async fn wallet_disconnected(&self) {
        self.machine
            .write()
            .await
            .handle_event(AuthEvent::WalletDisconnected);
    }

    pub async fn modal_closed(&self) {
        self.machine.write().await.handle_event(AuthEvent::ModalClosed);
    }

    /// Sign out, discarding interest in any outstanding step
    pub async fn sign_out(&self) {
        self.generation.bump();
        self.machine.write().await.handle_event(AuthEvent::SignOut);
    }

    pub async fn state(&self) -> AuthState {
        self.machine.read().await.state()
    }

    pub async fn context(&self) -> AuthContext {
        self.machine.read().await.context().clone()
    }

    pub async fn status_report(&self) -> AuthStatusReport {
        let machine = self.machine.read().await;
        let context = machine.context();
        AuthStatusReport {
            state: machine.state(),
            is_authenticated: machine.state().is_authenticated(),
            user_name: context.user_name.clone(),
            error: context.error.clone(),
            retry_count: context.retry_count,
        }
    }

    async fn send_and_drive(&self, event: AuthEvent) -> Result<(), WorkflowError> {
        let generation = self.generation.bump();
        {
            let mut machine = self.machine.write().await;
            machine.handle_event(event);
        }
        self.drive(generation).await
    }

    async fn drive(&self, generation: u64) -> Result<(), WorkflowError> {
        loop {
            let step = {
                let machine = self.machine.read().await;
                machine.state().invoked_step()
            };
            let Some(step) = step else {
                return Ok(());
            };

            let settlement = self.execute_step(step).await?;

            let mut machine = self.machine.write().await;
            if !self.generation.is_current(generation) {
                debug!(step = ?step, "Discarding stale auth step settlement");
                return Ok(());
            }
            machine.handle_event(settlement);
        }
    }

    async fn execute_step(&self, step: AuthStep) -> Result<AuthEvent, WorkflowError> {
        let context = { self.machine.read().await.context().clone() };

        let settlement = match step {
            AuthStep::RestoreSession => {
                // Routine outcome for first-time visitors: a failed silent
                // restore is indistinguishable from no session
                let session = match self.executor.restore_session().await {
                    Ok(session) => session,
                    Err(error) => {
                        info!(error = %error.normalize(), "Session restore failed, continuing unauthenticated");
                        None
                    }
                };
                AuthEvent::SessionRestored { session }
            }

            AuthStep::RegisterPasskey => {
                let user_name =
                    context
                        .user_name
                        .clone()
                        .ok_or(WorkflowError::MissingArtifact {
                            step: "register_passkey",
                            artifact: "user_name",
                        })?;
                match self.executor.register_passkey(&user_name).await {
                    Ok(session) => AuthEvent::PasskeyResolved { session },
                    Err(error) => AuthEvent::StepFailed {
                        message: error.normalize(),
                    },
                }
            }

            AuthStep::AuthenticatePasskey => {
                let user_name =
                    context
                        .user_name
                        .clone()
                        .ok_or(WorkflowError::MissingArtifact {
                            step: "authenticate_passkey",
                            artifact: "user_name",
                        })?;
                match self.executor.authenticate_passkey(&user_name).await {
                    Ok(session) => AuthEvent::PasskeyResolved { session },
                    Err(error) => AuthEvent::StepFailed {
                        message: error.normalize(),
                    },
                }
            }

            AuthStep::ClaimEns => {
                let name =
                    context
                        .pending_ens_name
                        .clone()
                        .ok_or(WorkflowError::MissingArtifact {
                            step: "claim_ens",
                            artifact: "pending_ens_name",
                        })?;
                match self.executor.claim_ens(&name).await {
                    Ok(()) => AuthEvent::EnsClaimed,
                    Err(error) => AuthEvent::StepFailed {
                        message: error.normalize(),
                    },
                }
            }
        };

        Ok(settlement)
    }
}
