//! Ingestion Coordinator
//!
//! normalize → adapter dispatch → severity → persist.
//!
//! Analysis failure never blocks storage: a timed-out, unreachable or
//! panicking adapter degrades to "no analysis" exactly once, with no retry.
//! Only validation and persistence errors reach the caller.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::normalizer::{normalize, Normalized, Submission, ValidationError};
use super::severity::SeverityPolicy;
use crate::detectors::{AdapterFailure, AdapterResult, DetectorKind, Detectors, Fields};
use crate::models::{Event, NewEvent};
use crate::store::{EventStore, StoreError};

/// Slack added on top of the adapter's own timeout
pub const ANALYSIS_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist event: {0}")]
    Persistence(#[from] StoreError),

    #[error("ingestion task did not complete: {0}")]
    Interrupted(String),
}

#[derive(Clone)]
pub struct IngestCoordinator {
    detectors: Detectors,
    store: Arc<dyn EventStore>,
    policy: SeverityPolicy,
    analysis_deadline: Duration,
}

impl IngestCoordinator {
    /// `detector_timeout` is the adapters' per-call timeout; the analysis
    /// step as a whole is bounded by it plus [`ANALYSIS_GRACE`].
    pub fn new(detectors: Detectors, store: Arc<dyn EventStore>, detector_timeout: Duration) -> Self {
        Self {
            detectors,
            store,
            policy: SeverityPolicy::default(),
            analysis_deadline: detector_timeout + ANALYSIS_GRACE,
        }
    }

    pub fn with_policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_analysis_deadline(mut self, deadline: Duration) -> Self {
        self.analysis_deadline = deadline;
        self
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Validate, analyze and durably record one submission.
    ///
    /// Once validation passes the rest runs on its own task, so a caller
    /// that goes away mid-analysis still gets its event recorded.
    pub async fn ingest(&self, submission: Submission) -> Result<Event, IngestError> {
        let normalized = normalize(submission)?;

        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.record(normalized).await })
            .await
            .map_err(|e| {
                tracing::error!("Ingestion task failed: {}", e);
                IngestError::Interrupted(e.to_string())
            })?
    }

    async fn record(&self, normalized: Normalized) -> Result<Event, IngestError> {
        let result = self.analyze(normalized.detector, normalized.data.clone()).await;
        if let Some(failure) = result.failure() {
            tracing::warn!(
                "Analysis unavailable for {} event ({}): {}",
                normalized.kind, failure.error, failure.message
            );
        }

        let assessment = self.policy.assess(&result);

        let event = self
            .store
            .insert(NewEvent {
                kind: normalized.kind,
                raw_data: normalized.raw_data(),
                analysis_result: assessment.analysis_result,
                is_threat: assessment.is_threat,
                severity: assessment.severity,
                confidence: assessment.confidence,
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist {} event: {}", normalized.kind, e);
                e
            })?;

        tracing::info!(
            "Event ingested: {} {} (severity: {}, threat: {})",
            event.kind, event.id, event.severity, event.is_threat
        );

        Ok(event)
    }

    /// Run one adapter, absorbing panics and overruns into a failure result
    pub async fn analyze(&self, kind: DetectorKind, fields: Fields) -> AdapterResult {
        let detector = self.detectors.get(kind);
        let mut task = tokio::spawn(async move { detector.analyze(&fields).await });

        match tokio::time::timeout(self.analysis_deadline, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!("Detector {} task failed: {}", kind, e);
                AdapterFailure::unknown(format!("Detector {} failed unexpectedly", kind)).into()
            }
            Err(_) => {
                task.abort();
                AdapterFailure::timeout(format!(
                    "Detector {} exceeded {}s",
                    kind,
                    self.analysis_deadline.as_secs_f32()
                ))
                .into()
            }
        }
    }
}
