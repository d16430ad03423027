//! Event ingestion pipeline

pub mod coordinator;
pub mod normalizer;
pub mod severity;

pub use coordinator::{IngestCoordinator, IngestError, ANALYSIS_GRACE};
pub use normalizer::{normalize, Normalized, Submission, ValidationError};
pub use severity::{classify, Assessment, SeverityPolicy};
