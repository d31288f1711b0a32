//! # Pending Events
//!
//! Follow-up reminders derived from interviews, and the background job that
//! creates them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Pending Events                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  scheduler ──► InterviewFeedbackJob ──► feedback_event_for      │
//! │                     │         │                                 │
//! │                     ▼         ▼                                 │
//! │        InterviewRepository  PendingEventRepository (unique key) │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod feedback;
pub mod job;
pub mod model;
pub mod repository;

pub use error::{EventError, Result};
pub use feedback::{FeedbackTrigger, feedback_event_for, feedback_job_key, feedback_trigger_for};
pub use job::{InterviewFeedbackJob, JobOutcome, SkipReason};
pub use model::{
    DedupKey, EventKind, Interview, InterviewStatus, InterviewType, PendingEvent, VacancyRef,
};
pub use repository::{InMemoryEventStore, InterviewRepository, PendingEventRepository};
