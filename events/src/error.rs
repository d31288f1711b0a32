//! Error types for pending events.

use thiserror::Error;
use uuid::Uuid;

use crate::model::DedupKey;

/// Result type alias for event operations.
pub type Result<T> = std::result::Result<T, EventError>;

/// Errors raised by event repositories and the feedback job.
#[derive(Error, Debug)]
pub enum EventError {
    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// An event with the same dedup key already exists.
    #[error("pending event already exists for {0}")]
    DuplicatePendingEvent(DedupKey),

    /// No event with this id.
    #[error("pending event not found: {0}")]
    EventNotFound(Uuid),

    /// The event belongs to another user.
    #[error("pending event {event_id} does not belong to user {user_id}")]
    NotOwner { event_id: Uuid, user_id: Uuid },
}
