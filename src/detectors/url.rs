//! URL Adapter
//!
//! Phishing classifier (`POST /api/v1/phishing/check-url`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::fields::{resolve_into, FieldDefault, FieldKind, FieldSpec, Fields};
use super::{AdapterResult, Detector, DetectorClient, DetectorKind};

pub const CHECK_URL_PATH: &str = "/api/v1/phishing/check-url";

pub const URL_FIELDS: [FieldSpec; 1] = [
    FieldSpec::new("url", FieldKind::NonEmptyText, FieldDefault::Required),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSubmission {
    /// Full URL or bare domain
    pub url: String,
}

impl UrlSubmission {
    pub fn from_fields(fields: &Fields) -> Result<Self, super::FieldError> {
        let mut submission: Self = resolve_into(&URL_FIELDS, fields)?;
        submission.url = submission.url.trim().to_string();
        Ok(submission)
    }
}

pub struct UrlDetector {
    client: DetectorClient,
}

impl UrlDetector {
    pub fn new(client: DetectorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Detector for UrlDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Url
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        let submission = match UrlSubmission::from_fields(fields) {
            Ok(submission) => submission,
            Err(e) => return e.into(),
        };
        let analyzed = json!({ "url": submission.url });

        self.client.analyze(CHECK_URL_PATH, &submission, analyzed).await
    }
}
