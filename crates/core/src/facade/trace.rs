//! # Run Trace
//!
//! The shape returned by every facade run, plus the tolerant request parser.

use super::pipeline::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;

/// Task used when the caller sends none
pub const DEFAULT_TASK: &str = "Ship a 10-minute demo and one KPI win";
/// KPI used when the caller sends none
pub const DEFAULT_KPI: &str = "p95_latency";

/// One pipeline step's synthetic outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StageRecord {
    pub stage: Stage,
    /// Always true; no failure path is modeled
    pub ok: bool,
    /// Cosmetic duration, not measured
    pub ms: u64,
    /// Stage-specific payload
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: Value,
}

/// Illustrative KPI block. Not derived from the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Kpis {
    pub p95_latency: String,
    pub cost_per_run: String,
    pub hitl_approval: String,
}

impl Default for Kpis {
    fn default() -> Self {
        Self {
            p95_latency: "7.6 s".to_string(),
            cost_per_run: "$0.014".to_string(),
            hitl_approval: "94.1%".to_string(),
        }
    }
}

/// The result of one facade run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RunTrace {
    pub run_id: String,
    /// Real wall-clock span of generation
    pub duration_ms: u64,
    pub stages: Vec<StageRecord>,
    pub kpis: Kpis,
}

impl RunTrace {
    /// Find the record for a stage
    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// The plan text produced by the Learn stage
    pub fn plan(&self) -> Option<&str> {
        self.stage(Stage::Learn)
            .and_then(|s| s.data.get("plan"))
            .and_then(Value::as_str)
    }

    /// Plain-text report of the run for terminals
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "runId: {} · {} ms", self.run_id, self.duration_ms);
        let _ = writeln!(
            out,
            "p95 latency: {} | cost per run: {} | HITL approval: {}",
            self.kpis.p95_latency, self.kpis.cost_per_run, self.kpis.hitl_approval
        );

        for record in &self.stages {
            let mark = if record.ok { "ok" } else { "FAIL" };
            let _ = writeln!(out, "\n[{}] {} ms ({})", record.stage, record.ms, mark);

            if let Some(plan) = record.data.get("plan").and_then(Value::as_str) {
                for line in plan.lines() {
                    let _ = writeln!(out, "    {}", line);
                }
            }
            if let Some(facts) = record.data.get("facts").and_then(Value::as_array) {
                for fact in facts.iter().filter_map(Value::as_str) {
                    let _ = writeln!(out, "    - {}", fact);
                }
            }
            if let Some(tools) = record.data.get("tools").and_then(Value::as_array) {
                for tool in tools {
                    let _ = writeln!(
                        out,
                        "    {} ok={} {}ms",
                        tool.get("tool").and_then(Value::as_str).unwrap_or("?"),
                        tool.get("ok").and_then(Value::as_bool).unwrap_or(false),
                        tool.get("ms").and_then(Value::as_u64).unwrap_or(0)
                    );
                }
            }
            if let Some(score) = record.data.get("score").and_then(Value::as_object) {
                let parts: Vec<String> = score.iter().map(|(k, v)| format!("{k}={v}")).collect();
                let _ = writeln!(out, "    {}", parts.join(" "));
            }
        }

        out
    }
}

/// Body of a run request. Both fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunInput {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub kpi: Option<String>,
}

impl RunInput {
    pub fn new(task: impl Into<String>, kpi: impl Into<String>) -> Self {
        Self {
            task: Some(task.into()),
            kpi: Some(kpi.into()),
        }
    }

    /// Parse raw request bytes. Never fails: malformed JSON, non-object
    /// bodies and non-string fields all read as missing.
    pub fn from_slice(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            task: text("task"),
            kpi: text("kpi"),
        }
    }

    /// Task and KPI with defaults applied. A field falls back when it is
    /// missing, null, not a string, or blank.
    pub fn resolve(&self) -> (String, String) {
        (
            or_default(self.task.as_deref(), DEFAULT_TASK),
            or_default(self.kpi.as_deref(), DEFAULT_KPI),
        )
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
