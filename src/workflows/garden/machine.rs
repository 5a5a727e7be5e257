use serde::{Deserialize, Serialize};
use statig::prelude::*;

use super::steps::GardenDraft;

/// Form progress reported by the hosting wizard on every navigation event.
/// Field-level validation is entirely the host's responsibility; the machine
/// only reads these flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStatus {
    pub step: u32,
    pub total_steps: u32,
    pub can_proceed: bool,
    pub is_review_ready: bool,
}

impl FormStatus {
    pub fn is_last_step(&self) -> bool {
        self.step + 1 >= self.total_steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GardenEvent {
    Open,
    Next { form: FormStatus },
    Back { form: FormStatus },
    Review { form: FormStatus },
    Submit { form: FormStatus, draft: GardenDraft },
    Edit,
    SubmitSucceeded { tx_hash: String },
    SubmitFailed { message: String },
    Retry,
    CreateAnother,
    Close,
    Reset,
}

/// Queryable mirror of the active state, updated on every transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GardenPhase {
    #[default]
    Idle,
    Collecting,
    Review,
    Submitting,
    Succeeded,
    Failed,
}

pub struct GardenFlowMachine {
    pub phase: GardenPhase,
    pub last_form: Option<FormStatus>,
    pub draft: Option<GardenDraft>,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub retry_count: u8,
    max_retry_attempts: u8,
}

impl Default for GardenFlowMachine {
    fn default() -> Self {
        Self::new(crate::config::WorkflowConfig::default().max_retry_attempts)
    }
}

impl GardenFlowMachine {
    pub fn new(max_retry_attempts: u8) -> Self {
        Self {
            phase: GardenPhase::Idle,
            last_form: None,
            draft: None,
            tx_hash: None,
            error: None,
            retry_count: 0,
            max_retry_attempts,
        }
    }

    fn reset_context(&mut self) {
        self.last_form = None;
        self.draft = None;
        self.tx_hash = None;
        self.error = None;
        self.retry_count = 0;
    }

    pub fn is_open(&self) -> bool {
        self.phase != GardenPhase::Idle
    }

    pub fn is_submitted(&self) -> bool {
        self.tx_hash.is_some()
    }
}

#[state_machine(initial = "State::idle()")]
impl GardenFlowMachine {
    #[state]
    fn idle(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::Open => {
                self.phase = GardenPhase::Collecting;
                tracing::info!("Garden wizard opened");
                Transition(State::collecting())
            }
            _ => Handled,
        }
    }

    #[state]
    fn collecting(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::Next { form } => {
                if !form.can_proceed {
                    tracing::debug!(step = %form.step, "Next rejected, step incomplete");
                    return Handled;
                }
                self.last_form = Some(form.clone());
                if form.is_last_step() && form.is_review_ready {
                    self.phase = GardenPhase::Review;
                    tracing::info!("All steps collected, entering review");
                    Transition(State::review())
                } else {
                    // The host owns the step index; the machine only gatekeeps
                    Handled
                }
            }
            GardenEvent::Back { form } => {
                self.last_form = Some(form.clone());
                Handled
            }
            GardenEvent::Review { form } => {
                if form.is_review_ready {
                    self.last_form = Some(form.clone());
                    self.phase = GardenPhase::Review;
                    Transition(State::review())
                } else {
                    tracing::debug!("Review rejected, form not ready");
                    Handled
                }
            }
            GardenEvent::Close | GardenEvent::Reset => {
                self.reset_context();
                self.phase = GardenPhase::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }

    #[state]
    fn review(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::Submit { form, draft } => {
                if !form.is_review_ready {
                    tracing::debug!("Submit rejected, form not ready");
                    return Handled;
                }
                self.draft = Some(draft.clone());
                self.phase = GardenPhase::Submitting;
                tracing::info!(garden = %draft.name, "Submitting garden");
                Transition(State::submitting())
            }
            GardenEvent::Edit | GardenEvent::Back { .. } => {
                self.phase = GardenPhase::Collecting;
                Transition(State::collecting())
            }
            GardenEvent::Close | GardenEvent::Reset => {
                self.reset_context();
                self.phase = GardenPhase::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }

    #[state]
    fn submitting(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::SubmitSucceeded { tx_hash } => {
                self.tx_hash = Some(tx_hash.clone());
                self.retry_count = 0;
                self.phase = GardenPhase::Succeeded;
                tracing::info!(tx_hash = %tx_hash, "Garden created");
                Transition(State::succeeded())
            }
            GardenEvent::SubmitFailed { message } => {
                self.error = Some(message.clone());
                self.retry_count += 1;
                self.phase = GardenPhase::Failed;
                tracing::warn!(error = %message, retry_count = %self.retry_count, "Garden submission failed");
                Transition(State::failed())
            }
            GardenEvent::Close | GardenEvent::Reset => {
                self.reset_context();
                self.phase = GardenPhase::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }

    #[state]
    fn succeeded(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::CreateAnother => {
                self.reset_context();
                self.phase = GardenPhase::Collecting;
                tracing::info!("Starting another garden");
                Transition(State::collecting())
            }
            GardenEvent::Close | GardenEvent::Reset => {
                self.reset_context();
                self.phase = GardenPhase::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }

    #[state]
    fn failed(&mut self, event: &GardenEvent) -> Outcome<State> {
        match event {
            GardenEvent::Retry => {
                if self.retry_count >= self.max_retry_attempts {
                    tracing::warn!(
                        retry_count = %self.retry_count,
                        "Garden submission retries exhausted"
                    );
                    return Handled;
                }
                self.error = None;
                self.phase = GardenPhase::Submitting;
                Transition(State::submitting())
            }
            GardenEvent::Edit => {
                self.error = None;
                self.phase = GardenPhase::Collecting;
                Transition(State::collecting())
            }
            GardenEvent::Close | GardenEvent::Reset => {
                self.reset_context();
                self.phase = GardenPhase::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }
}
