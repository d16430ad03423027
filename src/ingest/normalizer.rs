//! Event Normalizer
//!
//! Checks an inbound submission's declared type and payload and resolves the
//! adapter that will analyze it. No side effects; the payload is passed
//! through untouched.

use serde_json::Value;
use thiserror::Error;

use crate::detectors::{DetectorKind, Fields};
use crate::models::EventKind;

/// Raw ingestion request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub kind: Option<String>,
    pub data: Option<Value>,
}

impl Submission {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: Some(kind.into()),
            data: Some(data),
        }
    }

    /// Pick `type` and `data` out of a parsed request body. A non-string
    /// `type` is kept in its JSON form so it fails as an invalid type.
    pub fn from_body(body: Value) -> Self {
        let Value::Object(mut body) = body else {
            return Self::default();
        };

        let kind = match body.remove("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(kind)) => Some(kind),
            Some(other) => Some(other.to_string()),
        };

        Self {
            kind,
            data: body.remove("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Type and data are required")]
    Missing,

    #[error("Invalid type. Must be: {}", registered_kinds())]
    InvalidType(String),

    #[error("Data must be a JSON object")]
    DataNotObject,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub kind: EventKind,
    pub detector: DetectorKind,
    /// The submitted `data` object, unmodified
    pub data: Fields,
}

impl Normalized {
    /// Payload as stored in `rawData`
    pub fn raw_data(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

pub fn normalize(submission: Submission) -> Result<Normalized, ValidationError> {
    let kind = submission.kind.filter(|k| !k.is_empty());
    let data = submission.data.filter(|d| !d.is_null());

    let (Some(kind), Some(data)) = (kind, data) else {
        return Err(ValidationError::Missing);
    };

    let kind = EventKind::parse(&kind).ok_or(ValidationError::InvalidType(kind))?;

    let Value::Object(data) = data else {
        return Err(ValidationError::DataNotObject);
    };

    Ok(Normalized {
        kind,
        detector: DetectorKind::for_event(kind),
        data,
    })
}

fn registered_kinds() -> String {
    EventKind::ALL
        .iter()
        .map(EventKind::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}
