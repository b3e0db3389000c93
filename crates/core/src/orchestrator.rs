//! # Orchestrator Client
//!
//! The remote agent orchestrator the live panels talk to. Three relative
//! paths hang off one base URL: `/config`, `/catalog` and `/agent/invoke`.

use crate::catalog::{usable_tools, CatalogEntry};
use crate::health::{classify_orchestrator, classify_provider, HealthTier, ProviderStatus};
use crate::probe::{ProbeRequest, ProbeResult, Prober};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Orchestrator the demo is wired to
pub const DEFAULT_BASE: &str = "https://agent-orchestrator-596716165839.us-west2.run.app";

/// Reference provider routed through invoke
pub const CLOCK_SERVER: &str = "clock";
pub const CLOCK_TOOL: &str = "get_time";
/// Provider whose tools are discovered from the catalog
pub const FASTAPI_SERVER: &str = "fastapi-mcp";

/// Providers a healthy orchestrator must have configured
pub fn default_expected_servers() -> Vec<String> {
    vec![CLOCK_SERVER.to_string(), FASTAPI_SERVER.to_string()]
}

/// Absolute URLs derived from the base
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorEndpoints {
    pub base: String,
    pub config: String,
    pub catalog: String,
    pub invoke: String,
}

impl OrchestratorEndpoints {
    pub fn new(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            config: format!("{}/config", base),
            catalog: format!("{}/catalog", base),
            invoke: format!("{}/agent/invoke", base),
            base,
        }
    }
}

impl Default for OrchestratorEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE)
    }
}

/// Body of an invoke call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub server: String,
    pub tool: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    json!({})
}

impl InvokeRequest {
    pub fn new(server: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            tool: tool.into(),
            arguments: empty_arguments(),
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    fn to_json(&self) -> Value {
        json!({
            "server": self.server,
            "tool": self.tool,
            "arguments": self.arguments,
        })
    }
}

/// CORS headers returned by a preflight
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorsHeaders {
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
}

impl CorsHeaders {
    pub fn from_result(result: &ProbeResult) -> Self {
        Self {
            allow_origin: result.header("access-control-allow-origin").map(str::to_string),
            allow_methods: result.header("access-control-allow-methods").map(str::to_string),
        }
    }

    /// Whether a page at `origin` may POST to invoke
    pub fn permits_post(&self, origin: &str) -> bool {
        let origin_ok = self
            .allow_origin
            .as_deref()
            .map(|o| o == "*" || o.eq_ignore_ascii_case(origin))
            .unwrap_or(false);
        let post_ok = self
            .allow_methods
            .as_deref()
            .map(|m| {
                m.split(',')
                    .map(str::trim)
                    .any(|m| m == "*" || m.eq_ignore_ascii_case("POST"))
            })
            .unwrap_or(false);
        origin_ok && post_ok
    }
}

/// Preflight outcome
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub result: ProbeResult,
    pub cors: CorsHeaders,
}

/// One provider's view from the catalog
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub server: String,
    pub status: ProviderStatus,
    pub label: String,
    pub tools: Vec<String>,
}

/// Config and catalog captured together, with derived health
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub endpoints: OrchestratorEndpoints,
    pub config: ProbeResult,
    pub catalog: ProbeResult,
    pub entries: Vec<CatalogEntry>,
    pub health: HealthTier,
    pub providers: Vec<ProviderReport>,
}

impl OrchestratorSnapshot {
    /// First usable tool a provider offers
    pub fn first_tool(&self, server: &str) -> Option<&str> {
        usable_tools(&self.entries, server)
            .first()
            .map(|e| e.tool_name.as_str())
    }
}

/// Probes the orchestrator's endpoints
#[derive(Clone)]
pub struct OrchestratorClient {
    prober: Prober,
    endpoints: OrchestratorEndpoints,
    origin: Option<String>,
}

impl OrchestratorClient {
    pub fn new(prober: Prober, endpoints: OrchestratorEndpoints) -> Self {
        Self {
            prober,
            endpoints,
            origin: None,
        }
    }

    /// Probe as a page served from `origin` would
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn endpoints(&self) -> &OrchestratorEndpoints {
        &self.endpoints
    }

    fn prepare(&self, request: ProbeRequest) -> ProbeRequest {
        match &self.origin {
            Some(origin) => request.with_origin(origin.clone()),
            None => request,
        }
    }

    pub async fn config(&self) -> ProbeResult {
        let request = self.prepare(ProbeRequest::get(&self.endpoints.config));
        self.prober.probe(&request).await
    }

    pub async fn catalog(&self) -> ProbeResult {
        let request = self.prepare(ProbeRequest::get(&self.endpoints.catalog));
        self.prober.probe(&request).await
    }

    pub async fn invoke(&self, invoke: &InvokeRequest) -> ProbeResult {
        tracing::info!(server = %invoke.server, tool = %invoke.tool, "Invoking tool");
        let request =
            self.prepare(ProbeRequest::post_json(&self.endpoints.invoke, invoke.to_json()));
        self.prober.probe(&request).await
    }

    /// The reference clock call
    pub async fn invoke_clock(&self) -> ProbeResult {
        self.invoke(&InvokeRequest::new(CLOCK_SERVER, CLOCK_TOOL)).await
    }

    /// OPTIONS against invoke to read its CORS headers
    pub async fn preflight(&self) -> PreflightReport {
        let request = self.prepare(ProbeRequest::options(&self.endpoints.invoke));
        let result = self.prober.probe(&request).await;
        PreflightReport {
            cors: CorsHeaders::from_result(&result),
            result,
        }
    }

    /// Fetch config and catalog concurrently and classify
    pub async fn snapshot(&self, expected_servers: &[String]) -> OrchestratorSnapshot {
        let (config, catalog) = tokio::join!(self.config(), self.catalog());

        let entries = catalog.body.catalog_entries();
        let health = classify_orchestrator(&config, &catalog, &entries, expected_servers);
        let providers = expected_servers
            .iter()
            .map(|server| {
                let status = classify_provider(Some(&catalog), &entries, server);
                ProviderReport {
                    server: server.clone(),
                    status,
                    label: status.to_string(),
                    tools: usable_tools(&entries, server)
                        .into_iter()
                        .map(|e| e.tool_name.clone())
                        .collect(),
                }
            })
            .collect();

        tracing::info!(
            base = %self.endpoints.base,
            health = %health,
            entries = entries.len(),
            "Orchestrator snapshot"
        );

        OrchestratorSnapshot {
            endpoints: self.endpoints.clone(),
            config,
            catalog,
            entries,
            health,
            providers,
        }
    }
}
