use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::steps::MintInput;
use crate::workflows::TransitionRecord;

/// All states of the hypercert minting workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintState {
    Idle,
    UploadingMetadata,
    UploadingAllowlist,
    Signing,
    Pending,
    Confirmed,
    Failed,
}

impl MintState {
    /// The async step invoked while in this state, if any
    pub fn invoked_step(&self) -> Option<MintStep> {
        match self {
            Self::UploadingMetadata => Some(MintStep::UploadMetadata),
            Self::UploadingAllowlist => Some(MintStep::UploadAllowlist),
            Self::Signing => Some(MintStep::BuildAndSignUserOp),
            Self::Pending => Some(MintStep::PollForReceipt),
            Self::Idle | Self::Confirmed | Self::Failed => None,
        }
    }

    pub fn is_working(&self) -> bool {
        self.invoked_step().is_some()
    }
}

/// Named steps of the mint flow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintStep {
    UploadMetadata,
    UploadAllowlist,
    BuildAndSignUserOp,
    PollForReceipt,
}

/// Events accepted by the mint machine. Settlement events are fed back by the
/// coordinator when an invoked step resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MintEvent {
    StartMint { input: MintInput },
    MetadataUploaded { cid: String },
    AllowlistUploaded { cid: String, merkle_root: String },
    UserOpSubmitted { hash: String },
    MintConfirmed { tx_hash: String, hypercert_id: String },
    StepFailed { message: String },
    Retry,
    Cancel,
}

/// Serializable record of one in-flight mint operation.
///
/// `input` is replaced wholesale by a new start; each artifact is written by
/// exactly one step's success transition and never mutated by any other step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintContext {
    pub input: Option<MintInput>,
    pub metadata_cid: Option<String>,
    pub allowlist_cid: Option<String>,
    pub merkle_root: Option<String>,
    pub user_op_hash: Option<String>,
    pub tx_hash: Option<String>,
    pub hypercert_id: Option<String>,
    pub error: Option<String>,
    pub retry_count: u8,
}

impl MintContext {
    /// Latest state whose prerequisite artifacts already exist. Retrying from
    /// here avoids re-uploading data that is already pinned.
    pub fn resume_state(&self) -> MintState {
        if self.user_op_hash.is_some() {
            MintState::Pending
        } else if self.merkle_root.is_some() {
            MintState::Signing
        } else if self.metadata_cid.is_some() {
            MintState::UploadingAllowlist
        } else {
            MintState::UploadingMetadata
        }
    }

    /// Drop all stage artifacts, error, and retry count, keeping `input`
    fn clear_progress(&mut self) {
        self.metadata_cid = None;
        self.allowlist_cid = None;
        self.merkle_root = None;
        self.user_op_hash = None;
        self.tx_hash = None;
        self.hypercert_id = None;
        self.error = None;
        self.retry_count = 0;
    }
}

/// Hypercert minting state machine.
///
/// Pure transition logic only: the machine owns state and context, while the
/// coordinator invokes the step belonging to the current state and feeds the
/// settlement back as an event.
#[derive(Debug)]
pub struct MintWorkflowMachine {
    state: MintState,
    context: MintContext,
    max_retry_attempts: u8,
    state_history: Vec<TransitionRecord<MintState, MintEvent>>,
}

impl MintWorkflowMachine {
    pub fn new(max_retry_attempts: u8) -> Self {
        Self {
            state: MintState::Idle,
            context: MintContext::default(),
            max_retry_attempts,
            state_history: Vec::new(),
        }
    }

    pub fn state(&self) -> MintState {
        self.state
    }

    pub fn context(&self) -> &MintContext {
        &self.context
    }

    pub fn state_history(&self) -> &[TransitionRecord<MintState, MintEvent>] {
        &self.state_history
    }

    fn record_transition(&mut self, from: MintState, to: MintState, event: MintEvent) {
        info!(
            from_state = ?from,
            to_state = ?to,
            event = ?event,
            retry_count = %self.context.retry_count,
            "Mint workflow state transition"
        );
        self.state_history
            .push(TransitionRecord::new(from, to, event));
        self.state = to;
    }

    /// Apply one event. Unmatched (state, event) pairs are deliberate no-ops:
    /// a settled step whose owning state is no longer active must not move
    /// the machine, and terminal states ignore stale retry/cancel events.
    pub fn handle_event(&mut self, event: MintEvent) {
        let from = self.state;

        match (from, &event) {
            (MintState::Idle | MintState::Confirmed | MintState::Failed, MintEvent::StartMint { input }) => {
                self.context = MintContext {
                    input: Some(input.clone()),
                    ..MintContext::default()
                };
                self.record_transition(from, MintState::UploadingMetadata, event);
            }

            (MintState::UploadingMetadata, MintEvent::MetadataUploaded { cid }) => {
                self.context.metadata_cid = Some(cid.clone());
                self.record_transition(from, MintState::UploadingAllowlist, event);
            }

            (MintState::UploadingAllowlist, MintEvent::AllowlistUploaded { cid, merkle_root }) => {
                self.context.allowlist_cid = Some(cid.clone());
                self.context.merkle_root = Some(merkle_root.clone());
                self.record_transition(from, MintState::Signing, event);
            }

            (MintState::Signing, MintEvent::UserOpSubmitted { hash }) => {
                self.context.user_op_hash = Some(hash.clone());
                self.record_transition(from, MintState::Pending, event);
            }

            (MintState::Pending, MintEvent::MintConfirmed { tx_hash, hypercert_id }) => {
                self.context.tx_hash = Some(tx_hash.clone());
                self.context.hypercert_id = Some(hypercert_id.clone());
                self.record_transition(from, MintState::Confirmed, event);
            }

            (state, MintEvent::StepFailed { message }) if state.is_working() => {
                warn!(
                    state = ?state,
                    error = %message,
                    "Mint step failed"
                );
                self.context.error = Some(message.clone());
                self.record_transition(from, MintState::Failed, event);
            }

            (MintState::Failed, MintEvent::Retry) => {
                if self.context.retry_count >= self.max_retry_attempts {
                    warn!(
                        retry_count = %self.context.retry_count,
                        max_retry_attempts = %self.max_retry_attempts,
                        "Mint retry attempts exhausted, staying in failed state"
                    );
                    return;
                }
                self.context.retry_count += 1;
                self.context.error = None;
                let resume = self.context.resume_state();
                self.record_transition(from, resume, event);
            }

            (state, MintEvent::Cancel) if state.is_working() || state == MintState::Failed => {
                self.context.clear_progress();
                self.record_transition(from, MintState::Idle, event);
            }

            _ => {
                debug!(state = ?from, event = ?event, "Ignoring event in current mint state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> MintInput {
        MintInput {
            metadata: json!({ "name": "Summer planting" }),
            allowlist: vec![super::super::steps::AllowlistEntry {
                address: "0xabc".to_string(),
                units: 100,
            }],
            total_units: 100,
            garden_id: "garden-1".to_string(),
            attestation_uids: vec!["0xdead".to_string()],
        }
    }

    fn machine_at_signing_failure() -> MintWorkflowMachine {
        let mut machine = MintWorkflowMachine::new(3);
        machine.handle_event(MintEvent::StartMint {
            input: sample_input(),
        });
        machine.handle_event(MintEvent::MetadataUploaded {
            cid: "cid-a".to_string(),
        });
        machine.handle_event(MintEvent::AllowlistUploaded {
            cid: "cid-b".to_string(),
            merkle_root: "0xroot".to_string(),
        });
        machine.handle_event(MintEvent::StepFailed {
            message: "User rejected".to_string(),
        });
        machine
    }

    #[test]
    fn start_enters_metadata_upload_with_fresh_context() {
        let mut machine = MintWorkflowMachine::new(3);
        machine.handle_event(MintEvent::StartMint {
            input: sample_input(),
        });

        assert_eq!(machine.state(), MintState::UploadingMetadata);
        assert!(machine.context().input.is_some());
        assert_eq!(machine.context().retry_count, 0);
        assert!(machine.context().metadata_cid.is_none());
    }

    #[test]
    fn retry_resumes_from_latest_state_with_artifacts() {
        let mut machine = machine_at_signing_failure();
        assert_eq!(machine.state(), MintState::Failed);
        assert_eq!(machine.context().error.as_deref(), Some("User rejected"));

        machine.handle_event(MintEvent::Retry);

        // Both uploads completed, so the retry re-enters signing directly
        assert_eq!(machine.state(), MintState::Signing);
        assert_eq!(machine.context().metadata_cid.as_deref(), Some("cid-a"));
        assert_eq!(machine.context().allowlist_cid.as_deref(), Some("cid-b"));
        assert_eq!(machine.context().merkle_root.as_deref(), Some("0xroot"));
        assert_eq!(machine.context().error, None);
        assert_eq!(machine.context().retry_count, 1);
    }

    #[test]
    fn resume_point_priority_order() {
        let mut context = MintContext::default();
        assert_eq!(context.resume_state(), MintState::UploadingMetadata);

        context.metadata_cid = Some("cid-a".to_string());
        assert_eq!(context.resume_state(), MintState::UploadingAllowlist);

        context.merkle_root = Some("0xroot".to_string());
        assert_eq!(context.resume_state(), MintState::Signing);

        context.user_op_hash = Some("0xop".to_string());
        assert_eq!(context.resume_state(), MintState::Pending);
    }

    #[test]
    fn fourth_retry_is_a_no_op() {
        let mut machine = machine_at_signing_failure();

        for _ in 0..3 {
            machine.handle_event(MintEvent::Retry);
            machine.handle_event(MintEvent::StepFailed {
                message: "still failing".to_string(),
            });
        }
        assert_eq!(machine.state(), MintState::Failed);
        assert_eq!(machine.context().retry_count, 3);

        machine.handle_event(MintEvent::Retry);
        assert_eq!(machine.state(), MintState::Failed);
        assert_eq!(machine.context().retry_count, 3);
    }

    #[test]
    fn cancel_clears_progress_but_keeps_input() {
        let mut machine = machine_at_signing_failure();
        machine.handle_event(MintEvent::Cancel);

        assert_eq!(machine.state(), MintState::Idle);
        let context = machine.context();
        assert_eq!(context.input, Some(sample_input()));
        assert_eq!(context.metadata_cid, None);
        assert_eq!(context.allowlist_cid, None);
        assert_eq!(context.merkle_root, None);
        assert_eq!(context.user_op_hash, None);
        assert_eq!(context.error, None);
        assert_eq!(context.retry_count, 0);
    }

    #[test]
    fn confirmed_ignores_retry_and_cancel() {
        let mut machine = machine_at_signing_failure();
        machine.handle_event(MintEvent::Retry);
        machine.handle_event(MintEvent::UserOpSubmitted {
            hash: "0xop".to_string(),
        });
        machine.handle_event(MintEvent::MintConfirmed {
            tx_hash: "0xtx".to_string(),
            hypercert_id: "42".to_string(),
        });
        assert_eq!(machine.state(), MintState::Confirmed);

        let snapshot = machine.context().clone();
        machine.handle_event(MintEvent::Cancel);
        machine.handle_event(MintEvent::Retry);

        assert_eq!(machine.state(), MintState::Confirmed);
        assert_eq!(machine.context(), &snapshot);
    }

    #[test]
    fn stale_settlement_does_not_move_the_machine() {
        let mut machine = MintWorkflowMachine::new(3);
        machine.handle_event(MintEvent::StartMint {
            input: sample_input(),
        });
        machine.handle_event(MintEvent::Cancel);
        assert_eq!(machine.state(), MintState::Idle);

        // A settlement for the abandoned upload arrives late
        machine.handle_event(MintEvent::MetadataUploaded {
            cid: "cid-late".to_string(),
        });
        assert_eq!(machine.state(), MintState::Idle);
        assert_eq!(machine.context().metadata_cid, None);
    }

    #[test]
    fn history_records_every_transition() {
        let machine = machine_at_signing_failure();
        let history = machine.state_history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].from_state, MintState::Idle);
        assert_eq!(history[3].to_state, MintState::Failed);
    }
}
