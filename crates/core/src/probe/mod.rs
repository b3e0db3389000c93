//! # Endpoint Probe
//!
//! One HTTP call against a remote endpoint, captured as a [`ProbeResult`]
//! that carries whatever was obtained plus an optional classified failure.
//! Probing never returns an error to the caller.
//!
//! - `transport` - The HTTP seam (reqwest in production, fakes in tests)
//! - `prober` - Classification and body interpretation

pub mod prober;
pub mod transport;

pub use prober::Prober;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};

use crate::catalog::{parse_catalog, parse_catalog_text, CatalogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shown for every cross-origin block
pub const CORS_MESSAGE: &str =
    "CORS blocked by server. For the demo, set ALLOW_ORIGINS='*' on the orchestrator.";

/// HTTP method of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    Get,
    Post,
    Options,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::Get => "GET",
            ProbeMethod::Post => "POST",
            ProbeMethod::Options => "OPTIONS",
        }
    }
}

/// A single outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: String,
    /// JSON body for POST
    pub json_body: Option<Value>,
    /// When set, sent as `Origin` and the response is held to browser CORS rules
    pub origin: Option<String>,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Get,
            url: url.into(),
            json_body: None,
            origin: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: ProbeMethod::Post,
            url: url.into(),
            json_body: Some(body),
            origin: None,
        }
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Options,
            url: url.into(),
            json_body: None,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Why a probe failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The browser (or its emulation) refused to expose the response
    CrossOriginBlocked,
    /// The request never got a response
    NetworkUnreachable,
    /// A response arrived with a non-2xx status
    HttpError,
}

impl FailureKind {
    /// User-facing explanation, distinct per kind
    pub fn guidance(&self) -> &'static str {
        match self {
            FailureKind::CrossOriginBlocked => CORS_MESSAGE,
            FailureKind::NetworkUnreachable => {
                "The endpoint could not be reached. \
                 Check the URL, DNS and that the service is running."
            }
            FailureKind::HttpError => {
                "The endpoint answered with an error status. See the response body for details."
            }
        }
    }
}

/// Classified failure attached to a probe result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub message: String,
    pub classification: FailureKind,
}

impl ProbeFailure {
    pub fn new(classification: FailureKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            classification,
        }
    }
}

/// Interpreted response body. Parsed and raw are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProbeBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ProbeBody {
    /// Parse attempt decides; the declared content type does not
    pub fn interpret(text: String) -> Self {
        if text.is_empty() {
            return ProbeBody::Empty;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ProbeBody::Json(value),
            Err(_) => ProbeBody::Text(text),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ProbeBody::Json(_))
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ProbeBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ProbeBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Catalog rows from whichever form was captured
    pub fn catalog_entries(&self) -> Vec<CatalogEntry> {
        match self {
            ProbeBody::Json(value) => parse_catalog(value),
            ProbeBody::Text(text) => parse_catalog_text(text),
            ProbeBody::Empty => Vec::new(),
        }
    }
}

/// Outcome of one external HTTP call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// `None` when the call never produced a response
    pub status: Option<u16>,
    pub ok: bool,
    pub body: ProbeBody,
    pub is_json: bool,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub fetched_at: DateTime<Utc>,
    pub failure: Option<ProbeFailure>,
}

impl ProbeResult {
    /// A call that produced no response
    pub fn unreached(failure: ProbeFailure) -> Self {
        Self {
            status: None,
            ok: false,
            body: ProbeBody::Empty,
            is_json: false,
            headers: BTreeMap::new(),
            fetched_at: Utc::now(),
            failure: Some(failure),
        }
    }

    /// Exactly HTTP 200
    pub fn is_status_200(&self) -> bool {
        self.status == Some(200)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.classification)
    }

    /// Short label for panels: `HTTP 200` or `No response`
    pub fn status_label(&self) -> String {
        match self.status {
            Some(status) => format!("HTTP {}", status),
            None => "No response".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret_body() {
        assert_eq!(ProbeBody::interpret(String::new()), ProbeBody::Empty);
        assert_eq!(
            ProbeBody::interpret(r#"{"ok":true}"#.to_string()),
            ProbeBody::Json(json!({"ok": true}))
        );
        assert_eq!(
            ProbeBody::interpret("<html>nope</html>".to_string()),
            ProbeBody::Text("<html>nope</html>".to_string())
        );
    }

    #[test]
    fn test_failure_kind_wire_names() {
        let names: Vec<String> = [
            FailureKind::CrossOriginBlocked,
            FailureKind::NetworkUnreachable,
            FailureKind::HttpError,
        ]
        .iter()
        .map(|k| serde_json::to_value(k).unwrap().as_str().unwrap().to_string())
        .collect();
        assert_eq!(names, ["cross-origin-blocked", "network-unreachable", "http-error"]);
    }

    #[test]
    fn test_guidance_is_distinct() {
        let cors = FailureKind::CrossOriginBlocked.guidance();
        let net = FailureKind::NetworkUnreachable.guidance();
        let http = FailureKind::HttpError.guidance();
        assert_ne!(cors, net);
        assert_ne!(net, http);
        assert!(cors.contains("ALLOW_ORIGINS"));
    }

    #[test]
    fn test_unreached_shape() {
        let result = ProbeResult::unreached(ProbeFailure::new(
            FailureKind::NetworkUnreachable,
            "connection refused",
        ));
        assert_eq!(result.status, None);
        assert!(!result.ok);
        assert_eq!(result.status_label(), "No response");
        assert_eq!(result.failure_kind(), Some(FailureKind::NetworkUnreachable));
    }

    #[test]
    fn test_text_body_feeds_catalog_parser() {
        let body = ProbeBody::Text("not json".to_string());
        assert!(body.catalog_entries().is_empty());
    }
}
