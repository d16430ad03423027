//! Access-Attempt Adapter
//!
//! Scores login/session telemetry with the access classifier
//! (`POST /api/v1/suspicious/check-access`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::fields::{resolve_into, FieldDefault, FieldKind, FieldSpec, Fields};
use super::{AdapterResult, Detector, DetectorClient, DetectorKind};

pub const CHECK_ACCESS_PATH: &str = "/api/v1/suspicious/check-access";

const COUNT: FieldKind = FieldKind::Integer { min: 0, max: i64::MAX };

/// Every access-attempt input, its validation range and default
pub const ACCESS_FIELDS: [FieldSpec; 9] = [
    FieldSpec::new("network_packet_size", COUNT, FieldDefault::Integer(1500)),
    FieldSpec::new("protocol_type", FieldKind::Text, FieldDefault::Text("HTTP")),
    FieldSpec::new("login_attempts", COUNT, FieldDefault::Integer(1)),
    FieldSpec::new(
        "session_duration",
        FieldKind::Number { min: 0.0, max: f64::MAX },
        FieldDefault::Number(30.0),
    ),
    FieldSpec::new("encryption_used", FieldKind::Text, FieldDefault::Text("TLS")),
    FieldSpec::new(
        "ip_reputation_score",
        FieldKind::Number { min: 0.0, max: 100.0 },
        FieldDefault::Number(50.0),
    ),
    FieldSpec::new("failed_logins", COUNT, FieldDefault::Integer(0)),
    FieldSpec::new("browser_type", FieldKind::Text, FieldDefault::Text("Chrome")),
    FieldSpec::new(
        "unusual_time_access",
        FieldKind::Integer { min: 0, max: 1 },
        FieldDefault::Integer(0),
    ),
];

/// Fully populated access-attempt parameters, as sent to the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAttempt {
    /// Packet size in bytes
    pub network_packet_size: i64,
    /// HTTP, HTTPS, FTP, SSH, ...
    pub protocol_type: String,
    pub login_attempts: i64,
    /// Minutes
    pub session_duration: f64,
    /// AES, RSA, TLS, None, ...
    pub encryption_used: String,
    /// 0-100, higher is better
    pub ip_reputation_score: f64,
    pub failed_logins: i64,
    pub browser_type: String,
    /// 0 = normal hours, 1 = unusual hours
    pub unusual_time_access: i64,
}

impl AccessAttempt {
    /// Fill defaults and validate ranges
    pub fn from_fields(fields: &Fields) -> Result<Self, super::FieldError> {
        resolve_into(&ACCESS_FIELDS, fields)
    }
}

pub struct AccessAttemptDetector {
    client: DetectorClient,
}

impl AccessAttemptDetector {
    pub fn new(client: DetectorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Detector for AccessAttemptDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Access
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        let params = match AccessAttempt::from_fields(fields) {
            Ok(params) => params,
            Err(e) => return e.into(),
        };
        let analyzed = serde_json::to_value(&params).unwrap_or_default();

        self.client.analyze(CHECK_ACCESS_PATH, &params, analyzed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::client::test_support::spawn;
    use crate::detectors::{AdapterErrorKind, FieldError};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_fields_yield_documented_defaults() {
        let params = AccessAttempt::from_fields(&Fields::new()).unwrap();
        assert_eq!(
            params,
            AccessAttempt {
                network_packet_size: 1500,
                protocol_type: "HTTP".to_string(),
                login_attempts: 1,
                session_duration: 30.0,
                encryption_used: "TLS".to_string(),
                ip_reputation_score: 50.0,
                failed_logins: 0,
                browser_type: "Chrome".to_string(),
                unusual_time_access: 0,
            }
        );
    }

    #[test]
    fn test_defaulting_is_idempotent() {
        let once = AccessAttempt::from_fields(&Fields::new()).unwrap();
        let as_fields = fields(serde_json::to_value(&once).unwrap());
        let twice = AccessAttempt::from_fields(&as_fields).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_provided_fields_kept() {
        let params = AccessAttempt::from_fields(&fields(json!({
            "failed_logins": 5,
            "ip_reputation_score": 10,
            "protocol_type": "SSH",
        })))
        .unwrap();

        assert_eq!(params.failed_logins, 5);
        assert_eq!(params.ip_reputation_score, 10.0);
        assert_eq!(params.protocol_type, "SSH");
        assert_eq!(params.browser_type, "Chrome");
    }

    #[test]
    fn test_explicit_zero_is_not_replaced() {
        let params = AccessAttempt::from_fields(&fields(json!({ "ip_reputation_score": 0 }))).unwrap();
        assert_eq!(params.ip_reputation_score, 0.0);
    }

    #[test]
    fn test_reputation_out_of_range() {
        let err = AccessAttempt::from_fields(&fields(json!({ "ip_reputation_score": 150 }))).unwrap_err();
        assert!(matches!(err, FieldError::OutOfRange { field: "ip_reputation_score", .. }));
    }

    #[test]
    fn test_unusual_time_is_binary() {
        let err = AccessAttempt::from_fields(&fields(json!({ "unusual_time_access": 2 }))).unwrap_err();
        assert!(matches!(err, FieldError::OutOfRange { field: "unusual_time_access", .. }));
    }

    #[tokio::test]
    async fn test_invalid_field_skips_remote_call() {
        let client = DetectorClient::new(None, Duration::from_secs(1)).unwrap();
        let detector = AccessAttemptDetector::new(client);

        let result = detector.analyze(&fields(json!({ "failed_logins": -1 }))).await;
        assert_eq!(result.failure().unwrap().error, AdapterErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_analyzed_params_reflect_defaults() {
        let app = Router::new().route(
            CHECK_ACCESS_PATH,
            post(|Json(body): Json<AccessAttempt>| async move {
                let suspicious = body.failed_logins >= 5;
                Json(json!({
                    "prediction": if suspicious { "attack" } else { "normal" },
                    "is_suspicious": suspicious,
                    "confidence": 0.95,
                    "details": { "risk_level": "high" },
                }))
            }),
        );
        let client = DetectorClient::new(Some(spawn(app).await), Duration::from_secs(5)).unwrap();
        let detector = AccessAttemptDetector::new(client);

        let result = detector
            .analyze(&fields(json!({ "failed_logins": 5, "ip_reputation_score": 10 })))
            .await;
        let analysis = result.analysis().unwrap();

        assert!(analysis.is_threat);
        assert_eq!(analysis.prediction, "attack");
        assert_eq!(analysis.analyzed_params["failed_logins"], json!(5));
        assert_eq!(analysis.analyzed_params["protocol_type"], json!("HTTP"));
        assert_eq!(analysis.analyzed_params["unusual_time_access"], json!(0));
    }
}
