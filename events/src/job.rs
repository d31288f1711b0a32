//! The interview feedback job.
//!
//! Invoked by an external scheduler once an interview should be over. The job
//! creates at most one feedback reminder per interview and never reports a
//! failure back to the scheduler: every outcome, including errors, is logged
//! and discarded by [`InterviewFeedbackJob::execute`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{EventError, Result};
use crate::feedback::feedback_event_for;
use crate::model::{EventKind, InterviewStatus, PendingEvent};
use crate::repository::{InterviewRepository, PendingEventRepository};

/// Why the job did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The interview was deleted.
    InterviewNotFound,
    /// The interview now belongs to someone else.
    OwnerMismatch,
    /// The interview was completed, cancelled or missed.
    InterviewClosed(InterviewStatus),
    /// A feedback reminder already exists.
    AlreadyExists,
}

/// Result of one job invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Created(PendingEvent),
    Skipped(SkipReason),
}

/// Creates the feedback reminder for a finished interview.
pub struct InterviewFeedbackJob {
    interviews: Arc<dyn InterviewRepository>,
    events: Arc<dyn PendingEventRepository>,
}

impl InterviewFeedbackJob {
    pub fn new(
        interviews: Arc<dyn InterviewRepository>,
        events: Arc<dyn PendingEventRepository>,
    ) -> Self {
        Self { interviews, events }
    }

    /// Scheduler entry point. Never fails.
    pub async fn execute(&self, interview_id: Uuid, user_id: Uuid) {
        self.execute_at(interview_id, user_id, Utc::now()).await;
    }

    /// [`execute`](Self::execute) with an explicit creation time.
    pub async fn execute_at(&self, interview_id: Uuid, user_id: Uuid, now: DateTime<Utc>) {
        match self.try_run(interview_id, user_id, now).await {
            Ok(JobOutcome::Created(event)) => {
                info!(
                    "Created feedback event {} for interview {interview_id}",
                    event.id
                );
            }
            Ok(JobOutcome::Skipped(reason)) => {
                debug!("Skipped feedback event for interview {interview_id}: {reason:?}");
            }
            Err(e) => {
                error!("Error executing interview feedback job for interview {interview_id}: {e}");
            }
        }
    }

    /// Run the job and report what happened.
    pub async fn try_run(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<JobOutcome> {
        let Some(interview) = self.interviews.find_interview_by_id(interview_id).await? else {
            return Ok(JobOutcome::Skipped(SkipReason::InterviewNotFound));
        };

        if interview.user_id != user_id {
            return Ok(JobOutcome::Skipped(SkipReason::OwnerMismatch));
        }

        if interview.status.is_closed() {
            return Ok(JobOutcome::Skipped(SkipReason::InterviewClosed(
                interview.status,
            )));
        }

        let existing = self
            .events
            .find_existing_pending_event(
                user_id,
                EventKind::InterviewFeedback,
                Some(interview_id),
                None,
            )
            .await?;
        if !existing.is_empty() {
            return Ok(JobOutcome::Skipped(SkipReason::AlreadyExists));
        }

        let event = feedback_event_for(&interview, now);
        match self.events.save_pending_event(event).await {
            Ok(saved) => Ok(JobOutcome::Created(saved)),
            // Another invocation inserted between our check and our write.
            Err(EventError::DuplicatePendingEvent(_)) => {
                Ok(JobOutcome::Skipped(SkipReason::AlreadyExists))
            }
            Err(e) => Err(e),
        }
    }
}
