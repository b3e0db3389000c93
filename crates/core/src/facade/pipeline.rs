//! # Pipeline Stages
//!
//! The six CYCLE-F stages every facade run walks through, in order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the CYCLE-F pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Stage {
    /// Restate the task and attach the SLO/budget
    Clarify,
    /// Record what triggered the run
    Yield,
    /// Gather background facts
    Contextualize,
    /// Produce a plan
    Learn,
    /// Call tools
    Execute,
    /// Score the outcome
    Feedback,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 6] = [
        Stage::Clarify,
        Stage::Yield,
        Stage::Contextualize,
        Stage::Learn,
        Stage::Execute,
        Stage::Feedback,
    ];

    /// Display name, as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Clarify => "Clarify",
            Stage::Yield => "Yield",
            Stage::Contextualize => "Contextualize",
            Stage::Learn => "Learn",
            Stage::Execute => "Execute",
            Stage::Feedback => "Feedback",
        }
    }

    /// The stage after this one. `Feedback` is terminal.
    pub fn next(&self) -> Stage {
        match self {
            Stage::Clarify => Stage::Yield,
            Stage::Yield => Stage::Contextualize,
            Stage::Contextualize => Stage::Learn,
            Stage::Learn => Stage::Execute,
            Stage::Execute => Stage::Feedback,
            Stage::Feedback => Stage::Feedback,
        }
    }

    /// Check if this is the last stage
    pub fn is_terminal(&self) -> bool {
        *self == Stage::Feedback
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_advance() {
        let mut stage = Stage::Clarify;
        let mut walked = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            walked.push(stage);
        }
        assert_eq!(walked, Stage::ALL.to_vec());

        assert_eq!(Stage::Feedback.next(), Stage::Feedback);
    }

    #[test]
    fn test_stage_serializes_by_name() {
        let json = serde_json::to_string(&Stage::Contextualize).unwrap();
        assert_eq!(json, "\"Contextualize\"");
        assert_eq!(Stage::Learn.to_string(), "Learn");
    }
}
