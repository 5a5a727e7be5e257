// Green Goods Workflows - Async workflow state machines for the Green Goods dApp
// This exposes the workflow engine components for host hook layers and integration tests

pub mod config;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::WorkflowConfig;
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflows::auth::{
    AuthContext, AuthCoordinator, AuthEvent, AuthState, AuthStatusReport, AuthStep,
    AuthStepExecutor, AuthWorkflowMachine, LoginMethod, PasskeySession,
};
pub use workflows::garden::{
    FormStatus, GardenCoordinator, GardenDraft, GardenEvent, GardenFlowMachine, GardenPhase,
    GardenStepExecutor,
};
pub use workflows::mint::{
    AllowlistEntry, AllowlistUpload, MetadataUpload, MintContext, MintCoordinator, MintEvent,
    MintInput, MintReceipt, MintState, MintStatusReport, MintStep, MintStepExecutor,
    MintWorkflowMachine, SigningRequest, SubmittedUserOp,
};
pub use workflows::{StepError, TransitionRecord, WorkflowError};
