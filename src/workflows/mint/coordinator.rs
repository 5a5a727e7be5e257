use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::machine::{MintContext, MintEvent, MintState, MintStep, MintWorkflowMachine};
use super::steps::{MintInput, MintStepExecutor, SigningRequest};
use crate::config::WorkflowConfig;
use crate::workflows::error::{StepError, WorkflowError};
use crate::workflows::Generation;

/// Binds the mint machine to its host-supplied step executors.
///
/// One coordinator per in-flight mint operation. `start_mint` and `retry`
/// drive the machine until it reaches a state with no invoked step; `cancel`
/// may be called concurrently and supersedes any outstanding step, whose late
/// settlement is then discarded.
pub struct MintCoordinator {
    machine: Arc<RwLock<MintWorkflowMachine>>,
    executor: Arc<dyn MintStepExecutor>,
    config: WorkflowConfig,
    generation: Generation,
}

/// Snapshot of the mint workflow for host status rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintStatusReport {
    pub state: MintState,
    pub retry_count: u8,
    pub error: Option<String>,
    pub hypercert_id: Option<String>,
    pub transitions_count: usize,
}

impl MintCoordinator {
    pub fn new(executor: Arc<dyn MintStepExecutor>, config: WorkflowConfig) -> Self {
        let machine = MintWorkflowMachine::new(config.max_retry_attempts);
        Self {
            machine: Arc::new(RwLock::new(machine)),
            executor,
            config,
            generation: Generation::default(),
        }
    }

    /// Start a fresh mint operation and drive it until confirmed or failed
    pub async fn start_mint(&self, input: MintInput) -> Result<(), WorkflowError> {
        info!(garden_id = %input.garden_id, "Starting hypercert mint");
        let generation = self.generation.bump();
        {
            let mut machine = self.machine.write().await;
            machine.handle_event(MintEvent::StartMint { input });
        }
        self.drive(generation).await
    }

    /// Retry after a failure, resuming from the latest completed artifact
    pub async fn retry(&self) -> Result<(), WorkflowError> {
        let generation = self.generation.bump();
        {
            let mut machine = self.machine.write().await;
            machine.handle_event(MintEvent::Retry);
        }
        self.drive(generation).await
    }

    /// Cancel the operation, discarding interest in any outstanding step
    pub async fn cancel(&self) {
        self.generation.bump();
        let mut machine = self.machine.write().await;
        machine.handle_event(MintEvent::Cancel);
    }

    pub async fn state(&self) -> MintState {
        self.machine.read().await.state()
    }

    pub async fn context(&self) -> MintContext {
        self.machine.read().await.context().clone()
    }

    pub async fn status_report(&self) -> MintStatusReport {
        let machine = self.machine.read().await;
        let context = machine.context();
        MintStatusReport {
            state: machine.state(),
            retry_count: context.retry_count,
            error: context.error.clone(),
            hypercert_id: context.hypercert_id.clone(),
            transitions_count: machine.state_history().len(),
        }
    }

    /// Run invoked steps until the machine settles in a non-working state.
    /// A settlement is applied only if this attempt is still the current one.
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
                debug!(step = ?step, "Discarding stale mint step settlement");
                return Ok(());
            }
            machine.handle_event(settlement);
        }
    }

    async fn execute_step(&self, step: MintStep) -> Result<MintEvent, WorkflowError> {
        let context = { self.machine.read().await.context().clone() };
        let input = context.input.clone().ok_or(WorkflowError::MissingArtifact {
            step: "start_mint",
            artifact: "input",
        })?;

        let result = match step {
            MintStep::UploadMetadata => self
                .executor
                .upload_metadata(&input)
                .await
                .map(|upload| MintEvent::MetadataUploaded { cid: upload.cid }),

            MintStep::UploadAllowlist => self
                .executor
                .upload_allowlist(&input)
                .await
                .map(|upload| MintEvent::AllowlistUploaded {
                    cid: upload.cid,
                    merkle_root: upload.merkle_root,
                }),

            MintStep::BuildAndSignUserOp => {
                let request = SigningRequest::derive(
                    &input,
                    context.metadata_cid.as_deref(),
                    context.merkle_root.as_deref(),
                )?;
                self.executor
                    .build_and_sign_user_op(&request)
                    .await
                    .map(|op| MintEvent::UserOpSubmitted { hash: op.hash })
            }

            MintStep::PollForReceipt => {
                let hash = context
                    .user_op_hash
                    .clone()
                    .ok_or(WorkflowError::MissingArtifact {
                        step: "poll_for_receipt",
                        artifact: "user_op_hash",
                    })?;
                match tokio::time::timeout(
                    self.config.confirmation_timeout(),
                    self.executor.poll_for_receipt(&hash),
                )
                .await
                {
                    Ok(result) => result.map(|receipt| MintEvent::MintConfirmed {
                        tx_hash: receipt.tx_hash,
                        hypercert_id: receipt.hypercert_id,
                    }),
                    Err(_) => Err(StepError::message(format!(
                        "Transaction confirmation timed out after {}s",
                        self.config.confirmation_timeout_secs
                    ))),
                }
            }
        };

        Ok(match result {
            Ok(settlement) => settlement,
            Err(error) => MintEvent::StepFailed {
                message: error.normalize(),
            },
        })
    }
}
