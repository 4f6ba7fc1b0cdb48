//! Error types for the event manager and state machine.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors raised while deriving state or dispatching an event.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No service is registered for the routed stage name.
    #[error("no service registered for stage {stage}")]
    UnknownStage {
        /// Stage name the router produced.
        stage: &'static str,
    },
    /// Underlying repository operation failed.
    #[error(transparent)]
    Data(#[from] riven_data::DataError),
    /// Publishing a domain event failed.
    #[error("failed to publish event for item {item_id}")]
    EventPublish {
        /// Id of the item the event concerned.
        item_id: Uuid,
        /// Underlying event bus error.
        #[source]
        source: riven_events::EventBusError,
    },
}
