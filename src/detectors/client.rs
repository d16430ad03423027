//! Detector HTTP client
//!
//! Thin reqwest wrapper shared by all adapters. Every request carries the
//! client-side timeout; every failure is mapped onto an [`AdapterFailure`].

use std::time::Duration;

use serde::Serialize;

use super::{AdapterFailure, AdapterResult, DetectorReply};

/// Reported when no detector base URL is configured
pub const NOT_CONFIGURED: &str = "API no configurada";

#[derive(Debug, Clone)]
pub struct DetectorClient {
    base_url: Option<String>,
    http_client: reqwest::Client,
}

impl DetectorClient {
    /// Create new detector client. `base_url` of `None` is allowed; every
    /// call then fails softly with [`NOT_CONFIGURED`].
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// POST `params` to `path` and interpret the reply.
    ///
    /// `analyzed_params` is recorded verbatim on success.
    pub async fn analyze<P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
        analyzed_params: serde_json::Value,
    ) -> AdapterResult {
        let Some(base_url) = self.base_url.as_deref() else {
            return AdapterFailure::network(NOT_CONFIGURED).into();
        };
        let url = format!("{}{}", base_url, path);

        tracing::debug!("Detector request: POST {}", url);

        let response = match self.http_client.post(&url).json(params).send().await {
            Ok(response) => response,
            Err(e) => return map_transport_error(&url, e).into(),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Detector {} returned {}: {}", url, status.as_u16(), body);
            return AdapterFailure::network(format!("HTTP error! status: {}", status.as_u16())).into();
        }

        match response.json::<DetectorReply>().await {
            Ok(reply) => reply.into_result(analyzed_params),
            Err(e) if e.is_timeout() => AdapterFailure::timeout(format!("Detector timed out: {}", e)).into(),
            Err(e) => AdapterFailure::unknown(format!("Unreadable detector reply: {}", e)).into(),
        }
    }
}

fn map_transport_error(url: &str, err: reqwest::Error) -> AdapterFailure {
    if err.is_timeout() {
        tracing::warn!("Detector {} timed out", url);
        AdapterFailure::timeout("The analysis took too long")
    } else {
        tracing::warn!("Detector {} unreachable: {}", url, err);
        AdapterFailure::network(format!("Connection error: {}", err))
    }
}
