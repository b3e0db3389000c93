//! Probe execution and failure classification

use super::transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};
use super::{
    FailureKind, ProbeBody, ProbeFailure, ProbeMethod, ProbeRequest, ProbeResult, CORS_MESSAGE,
};
use chrono::Utc;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Error text that only cross-origin refusals produce
static CROSS_ORIGIN_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcors\b|cross-origin|access-control-allow-origin|failed to fetch")
        .expect("valid cross-origin regex")
});

/// Classify a failure that happened below HTTP
pub fn classify_transport_error(err: &TransportError) -> FailureKind {
    if CROSS_ORIGIN_SIGNATURE.is_match(&err.message) {
        FailureKind::CrossOriginBlocked
    } else {
        FailureKind::NetworkUnreachable
    }
}

/// Whether a browser would expose this response to a page at `origin`
fn cors_allows(headers: &BTreeMap<String, String>, origin: &str) -> bool {
    match headers.get("access-control-allow-origin") {
        Some(allowed) => {
            let allowed = allowed.trim();
            allowed == "*" || allowed.eq_ignore_ascii_case(origin)
        }
        None => false,
    }
}

fn normalize_headers(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in pairs {
        match headers.get_mut(&name.to_ascii_lowercase()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                headers.insert(name.to_ascii_lowercase(), value);
            }
        }
    }
    headers
}

fn status_line(status: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("HTTP {} {}", status, reason),
        _ => format!("HTTP {} Request failed", status),
    }
}

/// Issues probes and turns every outcome into a [`ProbeResult`]
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn HttpTransport>,
}

impl Prober {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Prober over a fresh reqwest client
    pub fn with_reqwest() -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    /// Run one probe. Never fails; faults land in `failure`.
    pub async fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        let started = Instant::now();
        let outcome = self.transport.send(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(raw) => Self::interpret(request, raw),
            Err(err) => {
                let kind = classify_transport_error(&err);
                let message = match kind {
                    FailureKind::CrossOriginBlocked => CORS_MESSAGE.to_string(),
                    _ => err.message,
                };
                ProbeResult::unreached(ProbeFailure::new(kind, message))
            }
        };

        match &result.failure {
            None => tracing::debug!(
                method = request.method.as_str(),
                url = %request.url,
                status = ?result.status,
                elapsed_ms,
                "Probe ok"
            ),
            Some(failure) => tracing::warn!(
                method = request.method.as_str(),
                url = %request.url,
                status = ?result.status,
                kind = ?failure.classification,
                elapsed_ms,
                "Probe failed: {}",
                failure.message
            ),
        }

        result
    }

    /// Dispatch a batch concurrently. Results come back in request order and
    /// one failure has no effect on the others.
    pub async fn probe_all(&self, requests: &[ProbeRequest]) -> Vec<ProbeResult> {
        join_all(requests.iter().map(|r| self.probe(r))).await
    }

    fn interpret(request: &ProbeRequest, raw: RawResponse) -> ProbeResult {
        let fetched_at = Utc::now();
        let headers = normalize_headers(raw.headers);

        // Preflights are returned as-is so their CORS headers can be read.
        if let Some(origin) = &request.origin {
            if request.method != ProbeMethod::Options && !cors_allows(&headers, origin) {
                return ProbeResult::unreached(ProbeFailure::new(
                    FailureKind::CrossOriginBlocked,
                    CORS_MESSAGE,
                ));
            }
        }

        let ok = (200..300).contains(&raw.status);
        let (body, body_failure) = match raw.body {
            Ok(text) => (ProbeBody::interpret(text), None),
            Err(err) => {
                let kind = classify_transport_error(&err);
                (ProbeBody::Empty, Some(ProbeFailure::new(kind, err.message)))
            }
        };

        let failure = if ok {
            body_failure
        } else {
            Some(ProbeFailure::new(
                FailureKind::HttpError,
                status_line(raw.status, raw.reason.as_deref()),
            ))
        };

        ProbeResult {
            status: Some(raw.status),
            ok,
            is_json: body.is_json(),
            body,
            headers,
            fetched_at,
            failure,
        }
    }
}
