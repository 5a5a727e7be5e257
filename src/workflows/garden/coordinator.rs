use statig::prelude::*;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::machine::{FormStatus, GardenEvent, GardenFlowMachine, GardenPhase};
use super::steps::{GardenDraft, GardenStepExecutor};
use crate::config::WorkflowConfig;
use crate::workflows::error::WorkflowError;
use crate::workflows::Generation;

/// Binds the garden wizard machine to the host-supplied submission executor.
///
/// Navigation events are pure gatekeeping; only `submit` and `retry` invoke
/// the async submission step.
pub struct GardenCoordinator {
    machine: Arc<RwLock<StateMachine<GardenFlowMachine>>>,
    executor: Arc<dyn GardenStepExecutor>,
    generation: Generation,
}

impl GardenCoordinator {
    pub fn new(executor: Arc<dyn GardenStepExecutor>, config: WorkflowConfig) -> Self {
        let machine = GardenFlowMachine::new(config.max_retry_attempts).state_machine();
        Self {
            machine: Arc::new(RwLock::new(machine)),
            executor,
            generation: Generation::default(),
        }
    }

    pub async fn open(&self) {
        self.send(GardenEvent::Open).await;
    }

    pub async fn next(&self, form: FormStatus) {
        self.send(GardenEvent::Next { form }).await;
    }

    pub async fn back(&self, form: FormStatus) {
        self.send(GardenEvent::Back { form }).await;
    }

    pub async fn review(&self, form: FormStatus) {
        self.send(GardenEvent::Review { form }).await;
    }

    pub async fn edit(&self) {
        self.send(GardenEvent::Edit).await;
    }

    pub async fn create_another(&self) {
        self.send(GardenEvent::CreateAnother).await;
    }

    /// Close the wizard, discarding interest in any outstanding submission
    pub async fn close(&self) {
        self.generation.bump();
        self.send(GardenEvent::Close).await;
    }

    pub async fn reset(&self) {
        self.generation.bump();
        self.send(GardenEvent::Reset).await;
    }

    /// Submit the collected garden data, if the form is review-ready
    pub async fn submit(&self, form: FormStatus, draft: GardenDraft) -> Result<(), WorkflowError> {
        let generation = self.generation.bump();
        self.send(GardenEvent::Submit { form, draft }).await;
        self.drive(generation).await
    }

    /// Re-invoke the submission after a failure, while retries remain
    pub async fn retry(&self) -> Result<(), WorkflowError> {
        let generation = self.generation.bump();
        self.send(GardenEvent::Retry).await;
        self.drive(generation).await
    }

    pub async fn phase(&self) -> GardenPhase {
        self.machine.read().await.inner().phase
    }

    pub async fn tx_hash(&self) -> Option<String> {
        self.machine.read().await.inner().tx_hash.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.machine.read().await.inner().error.clone()
    }

    async fn send(&self, event: GardenEvent) {
        let mut machine = self.machine.write().await;
        machine.handle(&event);
    }

    async fn drive(&self, generation: u64) -> Result<(), WorkflowError> {
        let draft = {
            let machine = self.machine.read().await;
            if machine.inner().phase != GardenPhase::Submitting {
                return Ok(());
            }
            machine.inner().draft.clone()
        };
        let draft = draft.ok_or(WorkflowError::MissingArtifact {
            step: "submit_garden",
            artifact: "draft",
        })?;

        let settlement = match self.executor.submit_garden(&draft).await {
            Ok(tx_hash) => GardenEvent::SubmitSucceeded { tx_hash },
            Err(error) => GardenEvent::SubmitFailed {
                message: error.normalize(),
            },
        };

        let mut machine = self.machine.write().await;
        if !self.generation.is_current(generation) {
            debug!("Discarding stale garden submission settlement");
            return Ok(());
        }
        machine.handle(&settlement);
        Ok(())
    }
}
