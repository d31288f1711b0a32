//! Interviews and the pending events derived from them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interview length assumed when none was recorded.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Interviewer name recorded when none was given.
pub const UNKNOWN_INTERVIEWER: &str = "Unknown";

/// Company name recorded in metadata when the vacancy has none.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Company wording used in prose when the vacancy has none.
pub const FALLBACK_COMPANY_MENTION: &str = "company";

/// Lifecycle state of an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
    NoShow,
}

impl InterviewStatus {
    /// Interviews that are closed out or never took place as scheduled.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            InterviewStatus::Completed | InterviewStatus::Cancelled | InterviewStatus::NoShow
        )
    }
}

/// Kind of interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    PhoneScreen,
    VideoCall,
    OnSite,
    Technical,
    Behavioral,
    FinalRound,
    HrInterview,
}

impl InterviewType {
    /// Human-readable name used in event descriptions.
    pub fn display_name(self) -> &'static str {
        match self {
            InterviewType::PhoneScreen => "phone screen",
            InterviewType::VideoCall => "video call",
            InterviewType::OnSite => "on-site interview",
            InterviewType::Technical => "technical interview",
            InterviewType::Behavioral => "behavioral interview",
            InterviewType::FinalRound => "final round interview",
            InterviewType::HrInterview => "HR interview",
        }
    }

    /// Stable identifier, as stored in metadata snapshots.
    pub fn code(self) -> &'static str {
        match self {
            InterviewType::PhoneScreen => "PHONE_SCREEN",
            InterviewType::VideoCall => "VIDEO_CALL",
            InterviewType::OnSite => "ON_SITE",
            InterviewType::Technical => "TECHNICAL",
            InterviewType::Behavioral => "BEHAVIORAL",
            InterviewType::FinalRound => "FINAL_ROUND",
            InterviewType::HrInterview => "HR_INTERVIEW",
        }
    }
}

/// Denormalized view of the vacancy an interview belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyRef {
    pub id: Uuid,
    pub title: String,
    pub company_name: Option<String>,
}

/// An interview, as read from the owning system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vacancy: VacancyRef,
    pub scheduled_at: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub status: InterviewStatus,
    /// Length in minutes, if recorded.
    pub duration_minutes: Option<u32>,
    pub interviewer_name: Option<String>,
}

impl Interview {
    /// Recorded duration, or [`DEFAULT_DURATION_MINUTES`].
    pub fn effective_duration_minutes(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    /// When the interview is expected to finish.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.effective_duration_minutes()))
    }
}

/// Kind of pending event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    InterviewFeedback,
    AiStatusChange,
    AiInterviewScheduled,
    SystemNotification,
}

impl EventKind {
    pub fn display_name(self) -> &'static str {
        match self {
            EventKind::InterviewFeedback => "Interview Feedback Required",
            EventKind::AiStatusChange => "Application Status Update",
            EventKind::AiInterviewScheduled => "Interview Scheduled",
            EventKind::SystemNotification => "System Notification",
        }
    }

    /// Priority for new events of this kind; 1 is highest.
    pub fn default_priority(self) -> u8 {
        match self {
            EventKind::InterviewFeedback => 1,
            EventKind::AiStatusChange | EventKind::AiInterviewScheduled => 2,
            EventKind::SystemNotification => 3,
        }
    }
}

/// Identifies "this follow-up already exists".
///
/// Events tied to an interview are unique per interview; other events are
/// unique per vacancy. [`DedupKey::new`] drops the vacancy when an interview
/// is present so both forms compare consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub user_id: Uuid,
    pub kind: EventKind,
    pub interview_id: Option<Uuid>,
    pub vacancy_id: Option<Uuid>,
}

impl DedupKey {
    pub fn new(
        user_id: Uuid,
        kind: EventKind,
        interview_id: Option<Uuid>,
        vacancy_id: Option<Uuid>,
    ) -> Self {
        Self {
            user_id,
            kind,
            interview_id,
            vacancy_id: if interview_id.is_some() { None } else { vacancy_id },
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} kind {:?}", self.user_id, self.kind)?;
        if let Some(id) = self.interview_id {
            write!(f, " interview {id}")?;
        }
        if let Some(id) = self.vacancy_id {
            write!(f, " vacancy {id}")?;
        }
        Ok(())
    }
}

/// A user-facing reminder derived from another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EventKind,
    pub title: String,
    pub description: Option<String>,
    pub priority: u8,
    pub interview_id: Option<Uuid>,
    pub vacancy_id: Option<Uuid>,
    /// Snapshot of the originating entity when the event was created.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub resolved: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingEvent {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.user_id, self.kind, self.interview_id, self.vacancy_id)
    }

    /// Mark resolved; a second call keeps the first resolution time.
    pub fn resolve(&mut self, now: DateTime<Utc>) {
        if !self.resolved {
            self.resolved = true;
            self.resolved_at = Some(now);
        }
    }
}
