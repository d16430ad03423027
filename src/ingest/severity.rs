//! Severity Classifier
//!
//! Maps a detector confidence onto a severity tier. One shared policy for
//! every detector type. Each tier is closed on its lower bound.

use serde::{Deserialize, Serialize};

use crate::detectors::{AdapterResult, Analysis};
use crate::models::Severity;

// ============================================================================
// THRESHOLDS
// ============================================================================

/// At or above = Critical
pub const CRITICAL_THRESHOLD: f64 = 0.9;

/// At or above = High
pub const HIGH_THRESHOLD: f64 = 0.7;

/// At or above = Medium, below = Low
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// Tier boundaries (configurable)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    pub critical_min: f64,
    pub high_min: f64,
    pub medium_min: f64,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            critical_min: CRITICAL_THRESHOLD,
            high_min: HIGH_THRESHOLD,
            medium_min: MEDIUM_THRESHOLD,
        }
    }
}

/// Values derived from one adapter outcome, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub is_threat: bool,
    pub severity: Severity,
    pub confidence: f64,
    /// Serialized adapter output; `None` when analysis failed
    pub analysis_result: Option<serde_json::Value>,
}

impl Default for Assessment {
    fn default() -> Self {
        Self {
            is_threat: false,
            severity: Severity::Low,
            confidence: 0.0,
            analysis_result: None,
        }
    }
}

impl SeverityPolicy {
    pub fn classify(&self, confidence: f64) -> Severity {
        let confidence = clamp_confidence(confidence);
        if confidence >= self.critical_min {
            Severity::Critical
        } else if confidence >= self.high_min {
            Severity::High
        } else if confidence >= self.medium_min {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Only a successful result is graded; failures get the defaults.
    pub fn assess(&self, result: &AdapterResult) -> Assessment {
        let Some(analysis) = result.analysis() else {
            return Assessment::default();
        };

        let confidence = clamp_confidence(analysis.confidence);
        // Stored result carries the same confidence as the event column
        let graded = AdapterResult::Success(Analysis {
            confidence,
            ..analysis.clone()
        });

        Assessment {
            is_threat: analysis.is_threat,
            severity: self.classify(confidence),
            confidence,
            analysis_result: serde_json::to_value(&graded).ok(),
        }
    }
}

/// Classify with the default thresholds
pub fn classify(confidence: f64) -> Severity {
    SeverityPolicy::default().classify(confidence)
}

/// Into [0, 1]; NaN and infinities become 0
pub fn clamp_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
