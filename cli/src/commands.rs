//! Command implementations. Each returns the JSON printed to stdout.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use compahunt_embeddings::{
    EmbeddingConfig, EmbeddingMode, EmbeddingProvider, EmbeddingRequest, SimilarityService,
    build_provider,
};
use compahunt_events::{
    InMemoryEventStore, Interview, InterviewFeedbackJob, JobOutcome, feedback_job_key,
    feedback_trigger_for,
};
use serde_json::{Value, json};
use tracing::info;

/// Build the similarity service from a config file, or defaults.
pub fn similarity_service(config_path: Option<&Path>) -> Result<SimilarityService> {
    let config = match config_path {
        Some(path) => EmbeddingConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EmbeddingConfig::default(),
    };
    info!("Embedding provider: {:?}", config.provider);
    Ok(SimilarityService::new(build_provider(&config)?))
}

pub async fn embed(service: &SimilarityService, text: &str, query: bool) -> Result<Value> {
    let mode = if query {
        EmbeddingMode::Query
    } else {
        EmbeddingMode::Passage
    };
    let response = service
        .provider()
        .embed(EmbeddingRequest::new(text).with_mode(mode))
        .await?;
    Ok(json!({
        "model": response.model,
        "dimension": response.dimension,
        "embedding": response.embedding,
    }))
}

pub async fn similarity(service: &SimilarityService, text_a: &str, text_b: &str) -> Result<Value> {
    let score = service.similarity(text_a, text_b).await?;
    Ok(json!({ "similarity": score }))
}

pub async fn rank(
    service: &SimilarityService,
    query: &str,
    candidates: &[String],
) -> Result<Value> {
    let ranked = service.rank(query, candidates).await?;
    Ok(serde_json::to_value(ranked)?)
}

/// Run the feedback job once against an in-memory store holding `path`.
pub async fn feedback(path: &Path, now: DateTime<Utc>) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let interview: Interview = serde_json::from_str(&content)
        .with_context(|| format!("invalid interview in {}", path.display()))?;

    let store = Arc::new(InMemoryEventStore::new());
    store.upsert_interview(interview.clone()).await;
    let job = InterviewFeedbackJob::new(store.clone(), store);

    // The trigger as it would have been registered when the interview was booked.
    let trigger = feedback_trigger_for(&interview, interview.scheduled_at).map(|t| {
        json!({
            "job_key": feedback_job_key(t.interview_id),
            "fire_at": t.fire_at,
        })
    });

    let outcome = match job.try_run(interview.id, interview.user_id, now).await? {
        JobOutcome::Created(event) => json!({ "created": event }),
        JobOutcome::Skipped(reason) => json!({ "skipped": format!("{reason:?}") }),
    };

    Ok(json!({ "trigger": trigger, "outcome": outcome }))
}
