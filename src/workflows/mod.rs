//! Asynchronous workflow state machines for the Green Goods dApp
//!
//! This module provides the three workflow engines behind the client-facing
//! flows: hypercert minting, authentication, and garden creation.
//!
//! # Architecture
//!
//! Each workflow follows the same pattern:
//! - **Machine**: a declarative state machine over a serializable context of
//!   stage artifacts, applying guarded transitions one event at a time
//! - **Step executors**: host-supplied async traits that perform the actual
//!   uploads, signing, polling, and session work; the machines never import
//!   HTTP, chain, or crypto clients themselves
//! - **Coordinator**: binds a machine to its executors, invokes the step
//!   belonging to the current state, and feeds the settlement back as an
//!   event, discarding settlements superseded by a cancel or a newer attempt
//!
//! # Key Features
//!
//! - Resumable retries that skip already-completed expensive steps
//! - Bounded retry counts with per-flow exhaustion behavior
//! - Cancellation that preserves the original input for a fresh restart
//! - Late-settlement race safety via a per-attempt generation counter
//! - Structured logging of every transition for audit trails

pub mod auth;
pub mod error;
pub mod garden;
pub mod mint;

pub use error::{StepError, WorkflowError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Audit-trail entry for one applied transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord<S, E> {
    pub from_state: S,
    pub to_state: S,
    pub event: E,
    pub timestamp: DateTime<Utc>,
}

impl<S: Clone, E> TransitionRecord<S, E> {
    pub fn new(from_state: S, to_state: S, event: E) -> Self {
        Self {
            from_state,
            to_state,
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Monotonic attempt counter used to discard stale step settlements.
///
/// Every start, retry, or cancel bumps the generation. A step records the
/// generation it was spawned under; if the counter has moved on by the time
/// the step settles, the settlement is dropped. Last transition wins.
#[derive(Debug, Default)]
pub(crate) struct Generation(AtomicU64);

impl Generation {
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.0.load(Ordering::SeqCst) == generation
    }
}
