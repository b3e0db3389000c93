//! # Plan Providers
//!
//! The Learn stage's only dynamic payload. Two implementations sit behind
//! [`PlanProvider`]: a fixed plan for when no credential is configured and a
//! single chat-completions call for when one is.

mod openai;

pub use openai::OpenAiPlan;

use crate::models::PlanConfig;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Returned when the provider answers without any content
pub const PLAN_UNAVAILABLE: &str = "- plan unavailable";
/// Returned when the provider call itself fails
pub const PLAN_PROVIDER_ERROR: &str = "- plan unavailable (provider error)";

const STATIC_PLAN: [&str; 4] = [
    "- Define KPI + guardrails for one-week win.",
    "- Ship a tiny workflow with HITL approvals.",
    "- Measure p95 latency and cost per run daily; kill or scale.",
    "- Add COMPASS-DRIVE rails (traces, budgets) after the win.",
];

/// Errors raised inside a live plan call. Never leave the provider.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("No API key configured")]
    MissingApiKey,
}

/// Produces the plan text for the Learn stage. Infallible by contract.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    async fn plan(&self, task: &str, facts: &[String]) -> String;
}

/// Fixed four-bullet plan
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticPlan;

impl StaticPlan {
    pub fn text() -> String {
        STATIC_PLAN.join("\n")
    }
}

#[async_trait]
impl PlanProvider for StaticPlan {
    fn name(&self) -> &str {
        "static"
    }

    async fn plan(&self, _task: &str, _facts: &[String]) -> String {
        Self::text()
    }
}

/// Pick the provider once from configuration
pub fn select_provider(config: &PlanConfig) -> Arc<dyn PlanProvider> {
    if !config.is_live() {
        tracing::info!("No plan provider credential configured, using static plan");
        return Arc::new(StaticPlan);
    }

    match OpenAiPlan::new(config.clone()) {
        Ok(provider) => {
            tracing::info!(model = %config.model, "Using live plan provider");
            Arc::new(provider)
        }
        Err(e) => {
            tracing::warn!("Failed to build live plan provider: {}, using static plan", e);
            Arc::new(StaticPlan)
        }
    }
}
