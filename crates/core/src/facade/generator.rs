//! # Facade Generator
//!
//! Assembles a synthetic six-stage trace. Only the Learn stage does real
//! work (through the injected plan provider); every other payload is fixed.

use super::pipeline::Stage;
use super::random::{RandomSource, ThreadRandom};
use super::trace::{Kpis, RunInput, RunTrace, StageRecord};
use crate::models::PlanConfig;
use crate::plan::{select_provider, PlanProvider, StaticPlan};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Route that triggers a run, echoed by the Yield stage
pub const TRIGGER: &str = "/api/facade/run";

/// Narrative facts attached by the Contextualize stage
pub const FACTS: [&str; 3] = [
    "COMPASS-DRIVE surrounds every stage with safety, policy, and cost controls.",
    "CYCLE-F = Clarify -> Yield -> Contextualize -> Learn -> Execute -> Feedback.",
    "HITL where it matters; schema checks at boundaries.",
];

/// Generates facade runs. Cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct FacadeGenerator {
    planner: Arc<dyn PlanProvider>,
    random: Arc<dyn RandomSource>,
}

impl FacadeGenerator {
    pub fn new(planner: Arc<dyn PlanProvider>, random: Arc<dyn RandomSource>) -> Self {
        Self { planner, random }
    }

    /// Static plan, thread RNG
    pub fn offline() -> Self {
        Self::new(Arc::new(StaticPlan), Arc::new(ThreadRandom))
    }

    /// Provider chosen from configuration, thread RNG
    pub fn from_config(config: &PlanConfig) -> Self {
        Self::new(select_provider(config), Arc::new(ThreadRandom))
    }

    /// Name of the plan provider in use
    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    /// Run with a parsed request body
    pub async fn run_input(&self, input: &RunInput) -> RunTrace {
        let (task, kpi) = input.resolve();
        self.run(&task, &kpi).await
    }

    /// Generate one trace. Blank task or KPI fall back to the defaults.
    #[tracing::instrument(skip(self), fields(planner = %self.planner.name()))]
    pub async fn run(&self, task: &str, kpi: &str) -> RunTrace {
        let (task, kpi) = RunInput::new(task, kpi).resolve();
        let started = Instant::now();
        let facts: Vec<String> = FACTS.iter().map(|f| f.to_string()).collect();
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let mut stage = Stage::Clarify;

        loop {
            let data = match stage {
                Stage::Clarify => json!({
                    "task": task,
                    "slo": { "kpi": kpi, "target": "<= 8s", "budget": "<= $0.25" },
                }),
                Stage::Yield => json!({
                    "trigger": TRIGGER,
                    "at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                }),
                Stage::Contextualize => json!({ "facts": facts }),
                Stage::Learn => json!({ "plan": self.planner.plan(&task, &facts).await }),
                Stage::Execute => json!({
                    "tools": [
                        { "tool": "vector.search", "ok": true, "ms": 110 },
                        { "tool": "slack.post", "ok": true, "ms": 90 },
                        { "tool": "db.write", "ok": true, "ms": 80 },
                    ],
                }),
                Stage::Feedback => json!({
                    "score": { "quality": 0.92, "grounded": 0.9, "est_cost_usd": 0.018 },
                }),
            };
            stages.push(self.record(stage, data));

            if stage.is_terminal() {
                break;
            }
            stage = stage.next();
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let trace = RunTrace {
            run_id: self.random.run_id(),
            duration_ms,
            stages,
            kpis: Kpis::default(),
        };

        tracing::info!(run_id = %trace.run_id, duration_ms, "Facade run complete");
        trace
    }

    fn record(&self, stage: Stage, data: Value) -> StageRecord {
        StageRecord {
            stage,
            ok: true,
            ms: self.random.stage_ms(),
            data,
        }
    }
}
