//! Feedback reminders owed after an interview.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::model::{
    EventKind, FALLBACK_COMPANY_MENTION, Interview, PendingEvent, UNKNOWN_COMPANY,
    UNKNOWN_INTERVIEWER,
};

/// Title of every feedback reminder.
pub const FEEDBACK_TITLE: &str = "Interview Feedback Required";

/// The call a scheduler should make once the interview is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTrigger {
    pub interview_id: Uuid,
    pub user_id: Uuid,
    pub fire_at: DateTime<Utc>,
}

/// Stable scheduler key for an interview's feedback job.
///
/// Registering a trigger under the same key replaces the previous one, so
/// rescheduling an interview does not leave a stale trigger behind.
pub fn feedback_job_key(interview_id: Uuid) -> String {
    format!("interview-feedback-{interview_id}")
}

/// Trigger for the feedback job, or `None` if the interview already ended.
pub fn feedback_trigger_for(interview: &Interview, now: DateTime<Utc>) -> Option<FeedbackTrigger> {
    let fire_at = interview.ends_at();
    if fire_at < now {
        return None;
    }
    Some(FeedbackTrigger {
        interview_id: interview.id,
        user_id: interview.user_id,
        fire_at,
    })
}

/// Build the feedback reminder for `interview`.
///
/// Defaults for missing duration, interviewer and company are applied here
/// and frozen into the metadata snapshot.
pub fn feedback_event_for(interview: &Interview, now: DateTime<Utc>) -> PendingEvent {
    let kind = EventKind::InterviewFeedback;
    let company = interview.vacancy.company_name.as_deref();

    let description = format!(
        "Please provide feedback for your {} with {} for the {} position.",
        interview.interview_type.display_name(),
        company.unwrap_or(FALLBACK_COMPANY_MENTION),
        interview.vacancy.title,
    );

    PendingEvent {
        id: Uuid::new_v4(),
        user_id: interview.user_id,
        kind,
        title: FEEDBACK_TITLE.to_string(),
        description: Some(description),
        priority: kind.default_priority(),
        interview_id: Some(interview.id),
        vacancy_id: Some(interview.vacancy.id),
        metadata: snapshot(interview),
        resolved: false,
        scheduled_for: Some(interview.ends_at()),
        resolved_at: None,
        created_at: now,
    }
}

fn snapshot(interview: &Interview) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(
        "scheduledAt".to_string(),
        json!(
            interview
                .scheduled_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
        ),
    );
    metadata.insert(
        "interviewType".to_string(),
        json!(interview.interview_type.code()),
    );
    metadata.insert(
        "duration".to_string(),
        json!(interview.effective_duration_minutes()),
    );
    metadata.insert(
        "interviewerName".to_string(),
        json!(
            interview
                .interviewer_name
                .as_deref()
                .unwrap_or(UNKNOWN_INTERVIEWER)
        ),
    );
    metadata.insert("jobTitle".to_string(), json!(interview.vacancy.title));
    metadata.insert(
        "companyName".to_string(),
        json!(
            interview
                .vacancy
                .company_name
                .as_deref()
                .unwrap_or(UNKNOWN_COMPANY)
        ),
    );
    metadata
}
