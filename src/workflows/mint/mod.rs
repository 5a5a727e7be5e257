//! Hypercert minting workflow
//!
//! Four sequential network steps (metadata upload, allowlist upload, signing,
//! confirmation polling) with four distinct resume points, so a retry after a
//! late failure never repeats an upload that already pinned its data.

pub mod coordinator;
pub mod machine;
pub mod steps;

pub use coordinator::{MintCoordinator, MintStatusReport};
pub use machine::{MintContext, MintEvent, MintState, MintStep, MintWorkflowMachine};
pub use steps::{
    AllowlistEntry, AllowlistUpload, MetadataUpload, MintInput, MintReceipt, MintStepExecutor,
    SigningRequest, SubmittedUserOp,
};
