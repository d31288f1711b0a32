//! Storage collaborators for interviews and pending events.
//!
//! The job only depends on the traits. [`InMemoryEventStore`] implements both
//! and enforces the dedup key as a uniqueness constraint, so two writers that
//! both miss the existence check cannot both insert.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EventError, Result};
use crate::model::{DedupKey, EventKind, Interview, PendingEvent};

/// Read access to interviews.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    async fn find_interview_by_id(&self, id: Uuid) -> Result<Option<Interview>>;
}

/// Read/write access to pending events.
#[async_trait]
pub trait PendingEventRepository: Send + Sync {
    /// Events for `user_id` and `kind`, resolved ones included.
    ///
    /// `interview_id` and `vacancy_id` narrow the result when `Some`. `None`
    /// matches any value, including events that have one set: a feedback
    /// reminder carries its vacancy, but its dedup key is the interview alone,
    /// so the lookup passes `None` for the vacancy and must still find it.
    async fn find_existing_pending_event(
        &self,
        user_id: Uuid,
        kind: EventKind,
        interview_id: Option<Uuid>,
        vacancy_id: Option<Uuid>,
    ) -> Result<Vec<PendingEvent>>;

    /// Persist a new event.
    ///
    /// Fails with [`EventError::DuplicatePendingEvent`] if an event with the
    /// same [`DedupKey`] is already stored.
    async fn save_pending_event(&self, event: PendingEvent) -> Result<PendingEvent>;

    /// Mark an event resolved on behalf of its owner.
    async fn resolve_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PendingEvent>;

    /// Unresolved events for a user, highest priority first, then oldest.
    async fn unresolved_for_user(&self, user_id: Uuid) -> Result<Vec<PendingEvent>>;

    async fn count_unresolved(&self, user_id: Uuid) -> Result<usize> {
        Ok(self.unresolved_for_user(user_id).await?.len())
    }
}

#[derive(Default)]
struct StoreState {
    interviews: HashMap<Uuid, Interview>,
    events: Vec<PendingEvent>,
    keys: HashSet<DedupKey>,
}

/// In-memory store for interviews and pending events.
#[derive(Default)]
pub struct InMemoryEventStore {
    state: RwLock<StoreState>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an interview.
    pub async fn upsert_interview(&self, interview: Interview) {
        self.state
            .write()
            .await
            .interviews
            .insert(interview.id, interview);
    }

    pub async fn remove_interview(&self, id: Uuid) -> Option<Interview> {
        self.state.write().await.interviews.remove(&id)
    }

    /// All stored events in insertion order.
    pub async fn events(&self) -> Vec<PendingEvent> {
        self.state.read().await.events.clone()
    }
}

#[async_trait]
impl InterviewRepository for InMemoryEventStore {
    async fn find_interview_by_id(&self, id: Uuid) -> Result<Option<Interview>> {
        Ok(self.state.read().await.interviews.get(&id).cloned())
    }
}

#[async_trait]
impl PendingEventRepository for InMemoryEventStore {
    async fn find_existing_pending_event(
        &self,
        user_id: Uuid,
        kind: EventKind,
        interview_id: Option<Uuid>,
        vacancy_id: Option<Uuid>,
    ) -> Result<Vec<PendingEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.user_id == user_id && e.kind == kind)
            .filter(|e| interview_id.is_none_or(|id| e.interview_id == Some(id)))
            .filter(|e| vacancy_id.is_none_or(|id| e.vacancy_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn save_pending_event(&self, event: PendingEvent) -> Result<PendingEvent> {
        let key = event.dedup_key();
        let mut state = self.state.write().await;

        if !state.keys.insert(key) {
            debug!("Rejected duplicate pending event for {key}");
            return Err(EventError::DuplicatePendingEvent(key));
        }

        state.events.push(event.clone());
        info!("Stored pending event {} ({:?})", event.id, event.kind);
        Ok(event)
    }

    async fn resolve_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PendingEvent> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(EventError::EventNotFound(event_id))?;

        if event.user_id != user_id {
            return Err(EventError::NotOwner { event_id, user_id });
        }

        event.resolve(now);
        Ok(event.clone())
    }

    async fn unresolved_for_user(&self, user_id: Uuid) -> Result<Vec<PendingEvent>> {
        let state = self.state.read().await;
        let mut events: Vec<PendingEvent> = state
            .events
            .iter()
            .filter(|e| e.user_id == user_id && !e.resolved)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.priority, e.created_at));
        Ok(events)
    }
}
