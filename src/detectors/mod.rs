//! Detector adapters
//!
//! Each adapter wraps one remote classification service behind the
//! [`Detector`] trait. Adapters fill defaults from their field table before
//! the remote call, so `analyzed_params` always records what was scored.
//! Failures are returned as [`AdapterResult::Failure`], never raised.
//!
//! ```text
//! fields ──► FieldSpec table ──► typed params ──► POST detector ──► AdapterResult
//!               (defaults,                          (30s timeout)
//!                validation)
//! ```

pub mod access;
pub mod client;
pub mod email;
pub mod fields;
pub mod flow_log;
pub mod url;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::models::EventKind;

pub use access::{AccessAttempt, AccessAttemptDetector};
pub use client::DetectorClient;
pub use email::{EmailDetector, EmailMessage};
pub use fields::{FieldDefault, FieldError, FieldKind, FieldSpec, Fields};
pub use flow_log::{FlowLogDetector, FlowLogRecord};
pub use self::url::{UrlDetector, UrlSubmission};

/// Client-side timeout for every detector call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Guidance returned alongside every failed analysis
pub const FALLBACK_GUIDANCE: &str =
    "The analysis service is unavailable right now; review the event manually against common attack patterns.";

// ============================================================================
// DETECTOR KINDS
// ============================================================================

/// The closed set of detector adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Access-attempt classifier
    Access,
    /// Network-flow-log classifier
    FlowLog,
    /// Message/email spam classifier
    Email,
    /// URL phishing classifier
    Url,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::Access,
        DetectorKind::FlowLog,
        DetectorKind::Email,
        DetectorKind::Url,
    ];

    /// Route segment used by the direct analysis endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Access => "access",
            DetectorKind::FlowLog => "logs",
            DetectorKind::Email => "email",
            DetectorKind::Url => "url",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// Adapter responsible for an ingestion kind
    pub fn for_event(kind: EventKind) -> Self {
        match kind {
            EventKind::NetworkAccess => DetectorKind::Access,
            EventKind::SuspiciousLogs => DetectorKind::FlowLog,
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ADAPTER RESULT
// ============================================================================

/// Why an analysis did not produce a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterErrorKind {
    Timeout,
    Network,
    Validation,
    Unknown,
}

impl AdapterErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterErrorKind::Timeout => "timeout",
            AdapterErrorKind::Network => "network",
            AdapterErrorKind::Validation => "validation",
            AdapterErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict returned by a detector service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub prediction: String,
    pub is_threat: bool,
    pub confidence: f64,
    pub details: serde_json::Value,
    /// Parameters actually sent to the detector, defaults included
    pub analyzed_params: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
}

/// Non-fatal adapter failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterFailure {
    pub error: AdapterErrorKind,
    pub message: String,
}

impl AdapterFailure {
    pub fn new(error: AdapterErrorKind, cause: impl std::fmt::Display) -> Self {
        Self {
            error,
            message: format!("{}. {}", cause, FALLBACK_GUIDANCE),
        }
    }

    pub fn timeout(cause: impl std::fmt::Display) -> Self {
        Self::new(AdapterErrorKind::Timeout, cause)
    }

    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::new(AdapterErrorKind::Network, cause)
    }

    pub fn validation(cause: impl std::fmt::Display) -> Self {
        Self::new(AdapterErrorKind::Validation, cause)
    }

    pub fn unknown(cause: impl std::fmt::Display) -> Self {
        Self::new(AdapterErrorKind::Unknown, cause)
    }
}

/// Outcome of one `analyze` call
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterResult {
    Success(Analysis),
    Failure(AdapterFailure),
}

impl AdapterResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AdapterResult::Success(_))
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            AdapterResult::Success(analysis) => Some(analysis),
            AdapterResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AdapterFailure> {
        match self {
            AdapterResult::Success(_) => None,
            AdapterResult::Failure(failure) => Some(failure),
        }
    }
}

impl From<AdapterFailure> for AdapterResult {
    fn from(failure: AdapterFailure) -> Self {
        AdapterResult::Failure(failure)
    }
}

impl From<FieldError> for AdapterResult {
    fn from(err: FieldError) -> Self {
        AdapterResult::Failure(AdapterFailure::validation(err))
    }
}

impl Serialize for AdapterResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T: Serialize> {
            success: bool,
            #[serde(flatten)]
            inner: &'a T,
        }

        match self {
            AdapterResult::Success(analysis) => Tagged { success: true, inner: analysis }.serialize(serializer),
            AdapterResult::Failure(failure) => Tagged { success: false, inner: failure }.serialize(serializer),
        }
    }
}

// ============================================================================
// DETECTOR TRAIT & REGISTRY
// ============================================================================

/// One remote classification service
#[async_trait]
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Analyze one submission. Must not share mutable state across calls.
    async fn analyze(&self, fields: &Fields) -> AdapterResult;
}

/// Closed dispatch table, one adapter per [`DetectorKind`]
#[derive(Clone)]
pub struct Detectors {
    access: Arc<dyn Detector>,
    flow_log: Arc<dyn Detector>,
    email: Arc<dyn Detector>,
    url: Arc<dyn Detector>,
}

impl Detectors {
    /// Remote adapters sharing one HTTP client
    pub fn remote(client: DetectorClient) -> Self {
        Self {
            access: Arc::new(AccessAttemptDetector::new(client.clone())),
            flow_log: Arc::new(FlowLogDetector::new(client.clone())),
            email: Arc::new(EmailDetector::new(client.clone())),
            url: Arc::new(UrlDetector::new(client)),
        }
    }

    /// Replace the adapter registered for `detector.kind()`
    pub fn with(mut self, detector: Arc<dyn Detector>) -> Self {
        match detector.kind() {
            DetectorKind::Access => self.access = detector,
            DetectorKind::FlowLog => self.flow_log = detector,
            DetectorKind::Email => self.email = detector,
            DetectorKind::Url => self.url = detector,
        }
        self
    }

    pub fn get(&self, kind: DetectorKind) -> Arc<dyn Detector> {
        match kind {
            DetectorKind::Access => self.access.clone(),
            DetectorKind::FlowLog => self.flow_log.clone(),
            DetectorKind::Email => self.email.clone(),
            DetectorKind::Url => self.url.clone(),
        }
    }
}

/// Reply shape shared by all detector services. The threat flag arrives
/// under a detector-specific name.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetectorReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default, alias = "is_suspicious", alias = "is_spam", alias = "is_phishing")]
    pub is_threat: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default, alias = "detail")]
    pub error: Option<String>,
}

impl DetectorReply {
    pub fn into_result(self, analyzed_params: serde_json::Value) -> AdapterResult {
        if self.success == Some(false) {
            let cause = self.error.unwrap_or_else(|| "detector reported failure".to_string());
            return AdapterFailure::unknown(cause).into();
        }

        AdapterResult::Success(Analysis {
            prediction: self.prediction.unwrap_or_else(|| "unknown".to_string()),
            is_threat: self.is_threat.unwrap_or(false),
            confidence: self.confidence.unwrap_or(0.0),
            details: self.details.unwrap_or(serde_json::Value::Null),
            analyzed_params,
            analyzed_at: Utc::now(),
        })
    }
}
