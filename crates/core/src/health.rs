//! # Health Classification
//!
//! Coarse badges derived from probe results.

use crate::catalog::{entries_for_server, has_sentinel, usable_tools, CatalogEntry};
use crate::probe::{FailureKind, ProbeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Badge colour for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
}

/// Overall orchestrator health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTier {
    Healthy,
    Degraded,
    Down,
}

impl HealthTier {
    pub fn tone(&self) -> Tone {
        match self {
            HealthTier::Healthy => Tone::Success,
            HealthTier::Degraded => Tone::Warning,
            HealthTier::Down => Tone::Danger,
        }
    }
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthTier::Healthy => "Healthy",
            HealthTier::Degraded => "Degraded",
            HealthTier::Down => "Down",
        };
        f.write_str(label)
    }
}

/// `servers_configured` from a config probe body, empty when absent
pub fn servers_configured(config: &ProbeResult) -> Vec<String> {
    config
        .body
        .json()
        .and_then(|body| body.get("servers_configured"))
        .and_then(Value::as_array)
        .map(|servers| {
            servers
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Classify orchestrator health. Checks run in order and the first
/// failing one decides: config not 200 is Down; catalog not 200, an error
/// sentinel, or a missing expected provider is Degraded.
pub fn classify_orchestrator(
    config: &ProbeResult,
    catalog: &ProbeResult,
    entries: &[CatalogEntry],
    expected_servers: &[String],
) -> HealthTier {
    if !config.is_status_200() {
        return HealthTier::Down;
    }
    if !catalog.is_status_200() {
        return HealthTier::Degraded;
    }
    if has_sentinel(entries) {
        return HealthTier::Degraded;
    }

    let configured = servers_configured(config);
    if expected_servers.iter().all(|s| configured.contains(s)) {
        HealthTier::Healthy
    } else {
        HealthTier::Degraded
    }
}

/// Status of one upstream tool provider as seen through the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    /// The catalog call was cross-origin blocked
    Private,
    Healthy,
    /// Only the error sentinel is listed
    Unavailable,
    Http(u16),
    NetworkError,
    /// No catalog probe has run yet
    Awaiting,
}

impl ProviderStatus {
    pub fn tone(&self) -> Tone {
        match self {
            ProviderStatus::Healthy => Tone::Success,
            ProviderStatus::Private => Tone::Warning,
            ProviderStatus::Unavailable | ProviderStatus::Http(_) => Tone::Danger,
            ProviderStatus::NetworkError | ProviderStatus::Awaiting => Tone::Info,
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStatus::Private => f.write_str("Private"),
            ProviderStatus::Healthy => f.write_str("Healthy"),
            ProviderStatus::Unavailable => f.write_str("Unavailable (503)"),
            ProviderStatus::Http(status) => write!(f, "HTTP {}", status),
            ProviderStatus::NetworkError => f.write_str("Network error"),
            ProviderStatus::Awaiting => f.write_str("Awaiting catalog"),
        }
    }
}

/// Classify one provider from the catalog probe and its parsed rows
pub fn classify_provider(
    catalog: Option<&ProbeResult>,
    entries: &[CatalogEntry],
    server: &str,
) -> ProviderStatus {
    let Some(catalog) = catalog else {
        return ProviderStatus::Awaiting;
    };

    if catalog.failure_kind() == Some(FailureKind::CrossOriginBlocked) {
        return ProviderStatus::Private;
    }
    if !usable_tools(entries, server).is_empty() {
        return ProviderStatus::Healthy;
    }
    if entries_for_server(entries, server)
        .iter()
        .any(|e| e.is_error_sentinel)
    {
        return ProviderStatus::Unavailable;
    }
    match catalog.status {
        Some(status) if status >= 400 => return ProviderStatus::Http(status),
        _ => {}
    }
    if catalog.failure_kind() == Some(FailureKind::NetworkUnreachable) {
        return ProviderStatus::NetworkError;
    }
    ProviderStatus::Awaiting
}

/// Badge for a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum InvokeBadge {
    Healthy,
    Http(Option<u16>),
    Awaiting,
}

impl InvokeBadge {
    pub fn from_result(result: Option<&ProbeResult>) -> Self {
        match result {
            None => InvokeBadge::Awaiting,
            Some(r) if r.is_status_200() => InvokeBadge::Healthy,
            Some(r) => InvokeBadge::Http(r.status),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            InvokeBadge::Healthy => Tone::Success,
            InvokeBadge::Http(_) => Tone::Danger,
            InvokeBadge::Awaiting => Tone::Info,
        }
    }
}

impl fmt::Display for InvokeBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeBadge::Healthy => f.write_str("Healthy"),
            InvokeBadge::Http(Some(status)) => write!(f, "HTTP {}", status),
            InvokeBadge::Http(None) => f.write_str("HTTP —"),
            InvokeBadge::Awaiting => f.write_str("Awaiting call"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::probe::{ProbeBody, ProbeFailure};
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn result(status: Option<u16>, body: Value) -> ProbeResult {
        let ok = matches!(status, Some(s) if (200..300).contains(&s));
        ProbeResult {
            status,
            ok,
            is_json: true,
            body: ProbeBody::Json(body),
            headers: BTreeMap::new(),
            fetched_at: Utc::now(),
            failure: if ok || status.is_none() {
                None
            } else {
                Some(ProbeFailure::new(FailureKind::HttpError, "HTTP error"))
            },
        }
    }

    fn expected() -> Vec<String> {
        vec!["clock".to_string(), "fastapi-mcp".to_string()]
    }

    fn good_config() -> ProbeResult {
        result(Some(200), json!({"servers_configured": ["clock", "fastapi-mcp", "extra"]}))
    }

    fn good_catalog() -> (ProbeResult, Vec<CatalogEntry>) {
        let body = json!({"catalog": [
            {"server": "clock", "tool": {"name": "get_time"}},
            {"server": "fastapi-mcp", "tool": {"name": "list_jobs"}}
        ]});
        let entries = parse_catalog(&body);
        (result(Some(200), body), entries)
    }

    #[test]
    fn test_healthy() {
        let (catalog, entries) = good_catalog();
        assert_eq!(
            classify_orchestrator(&good_config(), &catalog, &entries, &expected()),
            HealthTier::Healthy
        );
    }

    #[test]
    fn test_config_500_is_down_regardless_of_catalog() {
        let config = result(Some(500), json!({"servers_configured": ["clock", "fastapi-mcp"]}));
        let (catalog, entries) = good_catalog();
        assert_eq!(
            classify_orchestrator(&config, &catalog, &entries, &expected()),
            HealthTier::Down
        );

        let broken_catalog = ProbeResult::unreached(ProbeFailure::new(
            FailureKind::NetworkUnreachable,
            "refused",
        ));
        assert_eq!(
            classify_orchestrator(&config, &broken_catalog, &[], &expected()),
            HealthTier::Down
        );
    }

    #[test]
    fn test_unreached_config_is_down() {
        let config =
            ProbeResult::unreached(ProbeFailure::new(FailureKind::CrossOriginBlocked, "cors"));
        let (catalog, entries) = good_catalog();
        assert_eq!(
            classify_orchestrator(&config, &catalog, &entries, &expected()),
            HealthTier::Down
        );
    }

    #[test]
    fn test_degraded_paths() {
        let (catalog, entries) = good_catalog();

        let bad_catalog = result(Some(502), json!({}));
        assert_eq!(
            classify_orchestrator(&good_config(), &bad_catalog, &entries, &expected()),
            HealthTier::Degraded
        );

        let sentinel = parse_catalog(&json!([
            {"server": "fastapi-mcp", "tool": {"name": "__error__"}}
        ]));
        assert_eq!(
            classify_orchestrator(&good_config(), &catalog, &sentinel, &expected()),
            HealthTier::Degraded
        );

        let partial = result(Some(200), json!({"servers_configured": ["clock"]}));
        assert_eq!(
            classify_orchestrator(&partial, &catalog, &entries, &expected()),
            HealthTier::Degraded
        );

        let missing_field = result(Some(200), json!({"version": "1"}));
        assert_eq!(
            classify_orchestrator(&missing_field, &catalog, &entries, &expected()),
            HealthTier::Degraded
        );
    }

    #[test]
    fn test_provider_status() {
        assert_eq!(classify_provider(None, &[], "fastapi-mcp"), ProviderStatus::Awaiting);

        let (catalog, entries) = good_catalog();
        assert_eq!(
            classify_provider(Some(&catalog), &entries, "fastapi-mcp"),
            ProviderStatus::Healthy
        );

        let sentinel = parse_catalog(&json!([
            {"server": "fastapi-mcp", "tool": {"name": "__error__"}}
        ]));
        assert_eq!(
            classify_provider(Some(&catalog), &sentinel, "fastapi-mcp"),
            ProviderStatus::Unavailable
        );

        let failed = result(Some(404), json!({}));
        let status = classify_provider(Some(&failed), &[], "fastapi-mcp");
        assert_eq!(status, ProviderStatus::Http(404));
        assert_eq!(status.to_string(), "HTTP 404");
        assert_eq!(status.tone(), Tone::Danger);

        let blocked =
            ProbeResult::unreached(ProbeFailure::new(FailureKind::CrossOriginBlocked, "cors"));
        assert_eq!(classify_provider(Some(&blocked), &[], "fastapi-mcp"), ProviderStatus::Private);

        let offline =
            ProbeResult::unreached(ProbeFailure::new(FailureKind::NetworkUnreachable, "down"));
        assert_eq!(
            classify_provider(Some(&offline), &[], "fastapi-mcp"),
            ProviderStatus::NetworkError
        );
    }

    #[test]
    fn test_invoke_badge() {
        assert_eq!(InvokeBadge::from_result(None), InvokeBadge::Awaiting);
        assert_eq!(
            InvokeBadge::from_result(Some(&result(Some(200), json!({})))),
            InvokeBadge::Healthy
        );
        let badge = InvokeBadge::from_result(Some(&result(Some(500), json!({}))));
        assert_eq!(badge.to_string(), "HTTP 500");
        let unreached =
            ProbeResult::unreached(ProbeFailure::new(FailureKind::NetworkUnreachable, "x"));
        assert_eq!(InvokeBadge::from_result(Some(&unreached)).to_string(), "HTTP —");
    }
}
