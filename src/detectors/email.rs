//! Message/Email Adapter
//!
//! Spam classifier (`POST /api/v1/spam/classify`). The only input is the
//! full message text; there is nothing to default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::fields::{resolve_into, FieldDefault, FieldKind, FieldSpec, Fields};
use super::{AdapterResult, Detector, DetectorClient, DetectorKind};

pub const CLASSIFY_PATH: &str = "/api/v1/spam/classify";

/// Characters of the message kept in `analyzed_params`
pub const PREVIEW_CHARS: usize = 200;

pub const EMAIL_FIELDS: [FieldSpec; 1] = [
    FieldSpec::new("email_text", FieldKind::NonEmptyText, FieldDefault::Required),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Subject, body and anything else worth scoring
    pub email_text: String,
}

impl EmailMessage {
    pub fn from_fields(fields: &Fields) -> Result<Self, super::FieldError> {
        resolve_into(&EMAIL_FIELDS, fields)
    }

    pub fn preview(&self) -> String {
        self.email_text.chars().take(PREVIEW_CHARS).collect()
    }
}

pub struct EmailDetector {
    client: DetectorClient,
}

impl EmailDetector {
    pub fn new(client: DetectorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Detector for EmailDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Email
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        let message = match EmailMessage::from_fields(fields) {
            Ok(message) => message,
            Err(e) => return e.into(),
        };
        let analyzed = json!({ "email_preview": message.preview() });

        self.client.analyze(CLASSIFY_PATH, &message, analyzed).await
    }
}
