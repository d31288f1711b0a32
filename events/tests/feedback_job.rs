//! End-to-end behaviour of the interview feedback job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use compahunt_events::{
    EventError, EventKind, InMemoryEventStore, Interview, InterviewFeedbackJob, InterviewRepository,
    InterviewStatus, InterviewType, JobOutcome, PendingEvent, PendingEventRepository, Result,
    SkipReason, VacancyRef,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

fn scheduled_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
}

fn interview(duration_minutes: Option<u32>) -> Interview {
    Interview {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        vacancy: VacancyRef {
            id: Uuid::new_v4(),
            title: "Site Reliability Engineer".to_string(),
            company_name: Some("Oxide".to_string()),
        },
        scheduled_at: scheduled_at(),
        interview_type: InterviewType::Technical,
        status: InterviewStatus::Scheduled,
        duration_minutes,
        interviewer_name: None,
    }
}

async fn setup(interview: &Interview) -> (Arc<InMemoryEventStore>, InterviewFeedbackJob) {
    let store = Arc::new(InMemoryEventStore::new());
    store.upsert_interview(interview.clone()).await;
    let job = InterviewFeedbackJob::new(store.clone(), store.clone());
    (store, job)
}

#[tokio::test]
async fn test_scheduled_interview_gets_exactly_one_event() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;

    job.execute(interview.id, interview.user_id).await;
    job.execute(interview.id, interview.user_id).await;

    let events = store.events().await;
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.kind, EventKind::InterviewFeedback);
    assert_eq!(event.user_id, interview.user_id);
    assert_eq!(event.interview_id, Some(interview.id));
    assert_eq!(event.scheduled_for, Some(scheduled_at() + Duration::minutes(45)));
    assert_eq!(event.priority, 1);
    assert!(!event.resolved);
}

#[tokio::test]
async fn test_second_run_reports_already_exists() {
    let interview = interview(Some(30));
    let (_, job) = setup(&interview).await;
    let now = Utc::now();

    let first = job.try_run(interview.id, interview.user_id, now).await.unwrap();
    assert!(matches!(first, JobOutcome::Created(_)));

    let second = job.try_run(interview.id, interview.user_id, now).await.unwrap();
    assert_eq!(second, JobOutcome::Skipped(SkipReason::AlreadyExists));
}

#[tokio::test]
async fn test_closed_interviews_are_skipped() {
    for status in [
        InterviewStatus::Cancelled,
        InterviewStatus::Completed,
        InterviewStatus::NoShow,
    ] {
        let mut interview = interview(Some(45));
        interview.status = status;
        let (store, job) = setup(&interview).await;

        let outcome = job
            .try_run(interview.id, interview.user_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, JobOutcome::Skipped(SkipReason::InterviewClosed(status)));

        job.execute(interview.id, interview.user_id).await;
        assert!(store.events().await.is_empty());
    }
}

#[tokio::test]
async fn test_rescheduled_interview_still_gets_feedback() {
    let mut interview = interview(None);
    interview.status = InterviewStatus::Rescheduled;
    let (store, job) = setup(&interview).await;

    job.execute(interview.id, interview.user_id).await;
    assert_eq!(store.events().await.len(), 1);
}

#[tokio::test]
async fn test_missing_interview_is_a_no_op() {
    let store = Arc::new(InMemoryEventStore::new());
    let job = InterviewFeedbackJob::new(store.clone(), store.clone());

    let outcome = job
        .try_run(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::InterviewNotFound));

    job.execute(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn test_deleted_after_scheduling_is_a_no_op() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;
    store.remove_interview(interview.id).await;

    job.execute(interview.id, interview.user_id).await;
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn test_reassigned_interview_is_a_no_op() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;

    let outcome = job
        .try_run(interview.id, Uuid::new_v4(), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, JobOutcome::Skipped(SkipReason::OwnerMismatch));
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn test_resolved_reminder_is_not_recreated() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;

    job.execute(interview.id, interview.user_id).await;
    let event = store.events().await.remove(0);
    store
        .resolve_event(event.id, interview.user_id, Utc::now())
        .await
        .unwrap();

    job.execute(interview.id, interview.user_id).await;
    assert_eq!(store.events().await.len(), 1);
}

#[tokio::test]
async fn test_default_duration_applies_to_text_and_due_time() {
    let interview = interview(None);
    let (store, job) = setup(&interview).await;

    job.execute(interview.id, interview.user_id).await;

    let event = store.events().await.remove(0);
    assert_eq!(event.scheduled_for, Some(scheduled_at() + Duration::minutes(60)));
    assert_eq!(event.metadata["duration"], json!(60));
    assert_eq!(event.metadata["interviewerName"], json!("Unknown"));
    assert_eq!(event.metadata["companyName"], json!("Oxide"));
    assert_eq!(event.metadata["jobTitle"], json!("Site Reliability Engineer"));
    assert_eq!(
        event.description.as_deref(),
        Some(
            "Please provide feedback for your technical interview with Oxide \
             for the Site Reliability Engineer position."
        )
    );
}

#[tokio::test]
async fn test_snapshot_survives_interview_changes() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;
    job.execute(interview.id, interview.user_id).await;

    let mut changed = interview.clone();
    changed.duration_minutes = Some(90);
    changed.interviewer_name = Some("Sam".to_string());
    store.upsert_interview(changed).await;
    job.execute(interview.id, interview.user_id).await;

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].metadata["duration"], json!(45));
    assert_eq!(events[0].metadata["interviewerName"], json!("Unknown"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_create_one_event() {
    let interview = interview(Some(45));
    let (store, job) = setup(&interview).await;
    let job = Arc::new(job);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let job = Arc::clone(&job);
            let (interview_id, user_id) = (interview.id, interview.user_id);
            tokio::spawn(async move { job.execute(interview_id, user_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.events().await.len(), 1);
}

/// Simulates a stale read: the existence check never sees other writers.
struct StaleReads {
    inner: Arc<InMemoryEventStore>,
}

#[async_trait]
impl PendingEventRepository for StaleReads {
    async fn find_existing_pending_event(
        &self,
        _user_id: Uuid,
        _kind: EventKind,
        _interview_id: Option<Uuid>,
        _vacancy_id: Option<Uuid>,
    ) -> Result<Vec<PendingEvent>> {
        Ok(Vec::new())
    }

    async fn save_pending_event(&self, event: PendingEvent) -> Result<PendingEvent> {
        self.inner.save_pending_event(event).await
    }

    async fn resolve_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PendingEvent> {
        self.inner.resolve_event(event_id, user_id, now).await
    }

    async fn unresolved_for_user(&self, user_id: Uuid) -> Result<Vec<PendingEvent>> {
        self.inner.unresolved_for_user(user_id).await
    }
}

#[tokio::test]
async fn test_storage_constraint_backs_up_existence_check() {
    let interview = interview(Some(45));
    let store = Arc::new(InMemoryEventStore::new());
    store.upsert_interview(interview.clone()).await;
    let job = InterviewFeedbackJob::new(
        store.clone(),
        Arc::new(StaleReads {
            inner: store.clone(),
        }),
    );

    let now = Utc::now();
    let (a, b) = tokio::join!(
        job.try_run(interview.id, interview.user_id, now),
        job.try_run(interview.id, interview.user_id, now),
    );

    let outcomes = [a.unwrap(), b.unwrap()];
    let created = outcomes
        .iter()
        .filter(|o| matches!(o, JobOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert!(outcomes.contains(&JobOutcome::Skipped(SkipReason::AlreadyExists)));
    assert_eq!(store.events().await.len(), 1);
}

/// A repository whose backend is down.
struct Unavailable;

#[async_trait]
impl InterviewRepository for Unavailable {
    async fn find_interview_by_id(&self, _id: Uuid) -> Result<Option<Interview>> {
        Err(EventError::Storage("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failures_are_swallowed() {
    let store = Arc::new(InMemoryEventStore::new());
    let job = InterviewFeedbackJob::new(Arc::new(Unavailable), store.clone());

    let err = job
        .try_run(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::Storage(_)));

    // The scheduler entry point returns normally.
    job.execute(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(store.events().await.is_empty());
}
