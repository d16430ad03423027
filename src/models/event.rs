//! Event model

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Submission kinds accepted by the ingestion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Network access attempt (login/session telemetry)
    NetworkAccess,
    /// Network flow log line
    SuspiciousLogs,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::NetworkAccess, EventKind::SuspiciousLogs];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NetworkAccess => "network_access",
            EventKind::SuspiciousLogs => "suspicious_logs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity tiers, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Low
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted telemetry event. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Submitted payload, verbatim
    pub raw_data: serde_json::Value,
    /// Adapter output; `None` when analysis was unavailable
    pub analysis_result: Option<serde_json::Value>,
    pub is_threat: bool,
    pub severity: Severity,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Event as handed to a store; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub kind: EventKind,
    pub raw_data: serde_json::Value,
    pub analysis_result: Option<serde_json::Value>,
    pub is_threat: bool,
    pub severity: Severity,
    pub confidence: f64,
}

impl NewEvent {
    pub(crate) fn into_event(self, id: Uuid, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            kind: self.kind,
            raw_data: self.raw_data,
            analysis_result: self.analysis_result,
            is_threat: self.is_threat,
            severity: self.severity,
            confidence: self.confidence,
            created_at,
        }
    }
}

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Read-side filter for listing events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub limit: i64,
    pub threats_only: bool,
}

impl EventFilter {
    pub fn new(limit: Option<i64>, threats_only: bool) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
            threats_only,
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new(None, false)
    }
}

/// Aggregate counts over stored events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub total: i64,
    pub threats: i64,
    pub critical: i64,
}
