#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions)]

//! Derived state machine and per-item priority-queue event manager.
//!
//! States are never stored: [`state::derive_state`] recomputes them from an
//! item's (and its descendants') attributes on every dispatch. [`router`]
//! maps a derived state to the stage that should run next, and
//! [`scheduler::EventManager`] is the worker pool that drains a
//! `run_at`-ordered queue, enforces at most one in-flight event per item,
//! and re-enqueues whatever a [`service::Service`]'s outcome demands.

mod error;
mod in_progress;
mod queue;
mod router;
mod scheduler;
mod service;
mod state;

pub use error::{SchedulerError, SchedulerResult};
pub use in_progress::InProgressSet;
pub use queue::{EventQueue, ScheduledEvent};
pub use router::next_stage;
pub use scheduler::EventManager;
pub use service::{Service, ServiceError, ServiceOutcome};
pub use state::{derive_leaf, derive_state, fold};
