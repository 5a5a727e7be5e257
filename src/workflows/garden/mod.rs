//! Garden creation workflow
//!
//! A navigation/submission gatekeeper for the garden creation wizard. The
//! machine never recomputes form validity: every navigation event carries a
//! `FormStatus` snapshot from the hosting form layer, and pure guards on that
//! payload decide whether the event is permitted.

pub mod coordinator;
pub mod machine;
pub mod steps;

pub use coordinator::GardenCoordinator;
pub use machine::{FormStatus, GardenEvent, GardenFlowMachine, GardenPhase};
pub use steps::{GardenDraft, GardenStepExecutor};
