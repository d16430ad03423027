//! HTTP-level tests for the ingestion API against an in-memory store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

use khipu_server::{
    config::Config,
    create_router,
    detectors::{AdapterFailure, AdapterResult, Analysis, Detector, DetectorClient, DetectorKind, Detectors, Fields},
    ingest::IngestCoordinator,
    models::{Event, EventFilter, EventStats, NewEvent, Severity},
    store::{EventStore, MemoryEventStore, StoreError},
    AppState,
};

/// Detector returning a fixed verdict
struct FixedVerdict {
    kind: DetectorKind,
    is_threat: bool,
    confidence: f64,
}

#[async_trait]
impl Detector for FixedVerdict {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        AdapterResult::Success(Analysis {
            prediction: if self.is_threat { "attack" } else { "normal" }.to_string(),
            is_threat: self.is_threat,
            confidence: self.confidence,
            details: json!({ "model": "fixed" }),
            analyzed_params: json!(fields),
            analyzed_at: Utc::now(),
        })
    }
}

/// Detector that answers only after a delay
struct SlowVerdict {
    kind: DetectorKind,
    delay: Duration,
}

#[async_trait]
impl Detector for SlowVerdict {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    async fn analyze(&self, fields: &Fields) -> AdapterResult {
        tokio::time::sleep(self.delay).await;
        FixedVerdict { kind: self.kind, is_threat: true, confidence: 0.95 }
            .analyze(fields)
            .await
    }
}

/// Detector whose service is always down
struct Unreachable(DetectorKind);

#[async_trait]
impl Detector for Unreachable {
    fn kind(&self) -> DetectorKind {
        self.0
    }

    async fn analyze(&self, _fields: &Fields) -> AdapterResult {
        AdapterFailure::network("connection refused").into()
    }
}

/// Store that rejects every write
struct BrokenStore;

#[async_trait]
impl EventStore for BrokenStore {
    async fn insert(&self, _event: NewEvent) -> Result<Event, StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    async fn list(&self, _filter: EventFilter) -> Result<Vec<Event>, StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    async fn stats(&self) -> Result<EventStats, StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

fn fixed(kind: DetectorKind, is_threat: bool, confidence: f64) -> Arc<dyn Detector> {
    Arc::new(FixedVerdict { kind, is_threat, confidence })
}

fn unreachable(kind: DetectorKind) -> Arc<dyn Detector> {
    Arc::new(Unreachable(kind))
}

fn slow(kind: DetectorKind, delay: Duration) -> Arc<dyn Detector> {
    Arc::new(SlowVerdict { kind, delay })
}

fn app_with(store: Arc<dyn EventStore>, detectors: Vec<Arc<dyn Detector>>) -> Router {
    let client = DetectorClient::new(None, Duration::from_secs(1)).unwrap();
    let detectors = detectors
        .into_iter()
        .fold(Detectors::remote(client), |registry, d| registry.with(d));

    let state = AppState {
        coordinator: IngestCoordinator::new(detectors, store, Duration::from_secs(1)),
        config: Config::default(),
    };
    create_router(state)
}

fn threat_app(store: Arc<dyn EventStore>) -> Router {
    app_with(
        store,
        vec![
            fixed(DetectorKind::Access, true, 0.95),
            fixed(DetectorKind::FlowLog, false, 0.2),
        ],
    )
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = threat_app(Arc::new(MemoryEventStore::new()));
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["detector_configured"], false);
}

#[tokio::test]
async fn test_ingest_status_probe() {
    let app = threat_app(Arc::new(MemoryEventStore::new()));
    let (status, body) = send(&app, get("/api/v1/events/ingest")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event ingestion endpoint is working");
}

#[tokio::test]
async fn test_ingest_critical_access_attempt() {
    let store = Arc::new(MemoryEventStore::new());
    let app = threat_app(store.clone());

    let data = json!({ "failed_logins": 5, "ip_reputation_score": 10 });
    let request = post_json(
        "/api/v1/events/ingest",
        json!({ "type": "network_access", "data": data }).to_string(),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Event ingested and analyzed successfully");

    let event = &body["event"];
    assert_eq!(event["type"], "network_access");
    assert_eq!(event["severity"], "critical");
    assert_eq!(event["isThreat"], true);
    assert_eq!(event["confidence"], 0.95);
    assert_eq!(event["rawData"], data);
    assert_eq!(event["analysisResult"]["success"], true);
    assert!(event["id"].is_string());
    assert!(event["createdAt"].is_string());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ingest_with_detector_down_still_stores() {
    let store = Arc::new(MemoryEventStore::new());
    let app = app_with(store.clone(), vec![unreachable(DetectorKind::FlowLog)]);

    let data = json!({ "src_ip_addr": "10.0.0.5", "proto": "ssh" });
    let request = post_json(
        "/api/v1/events/ingest",
        json!({ "type": "suspicious_logs", "data": data }).to_string(),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let event = &body["event"];
    assert_eq!(event["severity"], "low");
    assert_eq!(event["isThreat"], false);
    assert_eq!(event["confidence"], 0.0);
    assert!(event["analysisResult"].is_null());
    assert_eq!(event["rawData"], data);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ingest_without_detector_api_configured() {
    // Remote adapters with no base URL
    let store = Arc::new(MemoryEventStore::new());
    let app = app_with(store.clone(), Vec::new());

    let request = post_json(
        "/api/v1/events/ingest",
        json!({ "type": "network_access", "data": {} }).to_string(),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["severity"], "low");
    assert!(body["event"]["analysisResult"].is_null());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ingest_validation_errors() {
    let store = Arc::new(MemoryEventStore::new());
    let app = threat_app(store.clone());

    let cases = [
        (json!({ "data": {} }).to_string(), "Type and data are required"),
        (json!({ "type": "network_access" }).to_string(), "Type and data are required"),
        (json!({ "type": "network_access", "data": null }).to_string(), "Type and data are required"),
        (
            json!({ "type": "email", "data": {} }).to_string(),
            "Invalid type. Must be: network_access or suspicious_logs",
        ),
        (json!({ "type": "suspicious_logs", "data": [1, 2] }).to_string(), "Data must be a JSON object"),
        ("{not json".to_string(), "Invalid JSON body"),
    ];

    for (body, expected) in cases {
        let (status, response) = send(&app, post_json("/api/v1/events/ingest", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], expected);
        assert_eq!(response["status"], 400);
    }

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_ingest_persistence_failure() {
    let app = threat_app(Arc::new(BrokenStore));

    let request = post_json(
        "/api/v1/events/ingest",
        json!({ "type": "network_access", "data": {} }).to_string(),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to ingest event");
    assert!(body.get("event").is_none());
}

#[tokio::test]
async fn test_list_and_stats() {
    let store = Arc::new(MemoryEventStore::new());
    let app = threat_app(store.clone());

    for kind in ["network_access", "suspicious_logs", "network_access"] {
        let request = post_json(
            "/api/v1/events/ingest",
            json!({ "type": kind, "data": { "seq": kind } }).to_string(),
        );
        assert_eq!(send(&app, request).await.0, StatusCode::OK);
    }

    let (status, all) = send(&app, get("/api/v1/events")).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1]["type"], "suspicious_logs");

    let (_, threats) = send(&app, get("/api/v1/events?threats_only=true&limit=1")).await;
    let threats = threats.as_array().unwrap();
    assert_eq!(threats.len(), 1);
    assert_eq!(threats[0]["id"], all[0]["id"]);

    let (status, stats) = send(&app, get("/api/v1/events/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "total": 3, "threats": 2, "critical": 2 }));
}

#[tokio::test]
async fn test_list_rejects_out_of_range_limit() {
    let app = threat_app(Arc::new(MemoryEventStore::new()));

    let (status, _) = send(&app, get("/api/v1/events?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/v1/events?limit=5000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_direct_analysis_is_not_persisted() {
    let store = Arc::new(MemoryEventStore::new());
    let app = threat_app(store.clone());

    let (status, body) = send(&app, post_json("/api/v1/analyze/access", json!({ "failed_logins": 2 }).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["is_threat"], true);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_direct_analysis_failure_is_data() {
    let app = app_with(Arc::new(MemoryEventStore::new()), vec![unreachable(DetectorKind::Url)]);

    let (status, body) = send(&app, post_json("/api/v1/analyze/url", json!({ "url": "http://x.test" }).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "network");
}

#[tokio::test]
async fn test_direct_analysis_unknown_detector() {
    let app = threat_app(Arc::new(MemoryEventStore::new()));

    let (status, body) = send(&app, post_json("/api/v1/analyze/spam", "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_client_disconnect_mid_analysis_keeps_event() {
    let store = Arc::new(MemoryEventStore::new());
    let app = app_with(store.clone(), vec![slow(DetectorKind::Access, Duration::from_millis(500))]);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let body = json!({ "type": "network_access", "data": { "failed_logins": 5 } }).to_string();
    let request = format!(
        "POST /api/v1/events/ingest HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        addr,
        body.len(),
        body
    );

    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(socket);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let stored = store.list(EventFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].raw_data, json!({ "failed_logins": 5 }));
    assert_eq!(stored[0].severity, Severity::Critical);
}
