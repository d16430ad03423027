//! Network-Flow-Log Adapter
//!
//! Scores one flow record (`POST /api/v1/suspicious-logs/check-log`). All
//! fields are strings so that upstream formats like `"2.1 M"` survive.
//! Missing `dst_pt` and `flags` are inferred from the protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::{resolve_into, FieldDefault, FieldKind, FieldSpec, Fields};
use super::{AdapterResult, Detector, DetectorClient, DetectorKind};

pub const CHECK_LOG_PATH: &str = "/api/v1/suspicious-logs/check-log";

/// Every flow-log input, its validation rule and default.
/// `proto` precedes the fields inferred from it.
pub const FLOW_LOG_FIELDS: [FieldSpec; 9] = [
    FieldSpec::new("duration", FieldKind::Lenient(is_non_negative_number), FieldDefault::Text("1")),
    FieldSpec::new("proto", FieldKind::Lenient(is_token), FieldDefault::Text("tcp")),
    FieldSpec::new("src_ip_addr", FieldKind::Lenient(is_token), FieldDefault::Text("192.168.1.100")),
    FieldSpec::new("src_pt", FieldKind::Lenient(is_port), FieldDefault::Text("50000")),
    FieldSpec::new("dst_ip_addr", FieldKind::Lenient(is_token), FieldDefault::Text("10.0.0.1")),
    FieldSpec::new("dst_pt", FieldKind::Lenient(is_port), FieldDefault::Inferred(infer_dst_port)),
    FieldSpec::new("packets", FieldKind::Lenient(is_non_negative_number), FieldDefault::Text("100")),
    FieldSpec::new("bytes_str", FieldKind::Lenient(is_byte_count), FieldDefault::Text("5000")),
    FieldSpec::new("flags", FieldKind::Lenient(is_any), FieldDefault::Inferred(infer_flags)),
];

/// Fully populated flow record, as sent to the detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLogRecord {
    /// Seconds, e.g. `"0.001"`
    pub duration: String,
    /// `tcp`, `udp`, `icmp`, ...
    pub proto: String,
    pub src_ip_addr: String,
    pub src_pt: String,
    pub dst_ip_addr: String,
    pub dst_pt: String,
    pub packets: String,
    /// Byte count with optional K/M suffix
    pub bytes_str: String,
    /// TCP flags, e.g. `"PA"`, `".AP..."`
    pub flags: String,
}

impl FlowLogRecord {
    /// Fill defaults and validate formats
    pub fn from_fields(fields: &Fields) -> Result<Self, super::FieldError> {
        resolve_into(&FLOW_LOG_FIELDS, fields)
    }
}

/// Well-known destination port for a protocol name
pub fn default_port_for(proto: &str) -> &'static str {
    match proto.trim().to_ascii_lowercase().as_str() {
        "https" | "tls" | "ssl" => "443",
        "ssh" | "sftp" => "22",
        "dns" | "udp" => "53",
        "icmp" => "0",
        // tcp, http and anything unrecognised
        _ => "80",
    }
}

/// Typical flags for a protocol: push/ack for TCP-family, none otherwise
pub fn default_flags_for(proto: &str) -> &'static str {
    match proto.trim().to_ascii_lowercase().as_str() {
        "tcp" | "http" | "https" | "tls" | "ssl" | "ssh" | "sftp" => "PA",
        _ => "",
    }
}

fn resolved_proto(resolved: &Fields) -> &str {
    resolved.get("proto").and_then(Value::as_str).unwrap_or("tcp")
}

fn infer_dst_port(resolved: &Fields) -> Value {
    Value::from(default_port_for(resolved_proto(resolved)))
}

fn infer_flags(resolved: &Fields) -> Value {
    Value::from(default_flags_for(resolved_proto(resolved)))
}

/// Parse a byte count such as `"1234"`, `"500 K"` or `"2.1 M"`
pub fn parse_bytes(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (number, multiplier) = if let Some(n) = upper.strip_suffix('M') {
        (n, 1_000_000.0)
    } else if let Some(n) = upper.strip_suffix('K') {
        (n, 1_000.0)
    } else {
        (upper.as_str(), 1.0)
    };

    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n * multiplier)
}

fn is_byte_count(value: &str) -> bool {
    parse_bytes(value).is_some()
}

fn is_non_negative_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n.is_finite() && n >= 0.0)
        .unwrap_or(false)
}

fn is_port(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n.fract() == 0.0 && (0.0..=65535.0).contains(&n))
        .unwrap_or(false)
}

fn is_token(value: &str) -> bool {
    !value.trim().is_empty()
}

fn is_any(_: &str) -> bool {
    true
}

pub struct FlowLogDetector {
    client: DetectorClient,
}

impl FlowLogDetector {
    pub fn new(client: DetectorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Detector for FlowLogDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::FlowLog
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        let record = match FlowLogRecord::from_fields(fields) {
            Ok(record) => record,
            Err(e) => return e.into(),
        };
        let analyzed = serde_json::to_value(&record).unwrap_or_default();

        self.client.analyze(CHECK_LOG_PATH, &record, analyzed).await
    }
}
