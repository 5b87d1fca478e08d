//! Diagnosis result types and depth presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::ProblemCategory;
use crate::invoker::StageResponse;
use crate::registry::REGISTRY_SIZE;

/// Record of one executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage identifier from the registry.
    pub stage_id: String,

    /// Model reference the stage was run against.
    pub model: String,

    /// Human role label.
    pub role: String,

    /// Display annotation carried over from the descriptor.
    pub chemistry: String,

    /// Model output, or the captured failure.
    pub response: StageResponse,

    /// Elapsed time for this stage in milliseconds.
    pub duration_ms: u64,
}

impl StageResult {
    pub fn succeeded(&self) -> bool {
        self.response.is_success()
    }

    pub fn response_text(&self) -> String {
        self.response.text()
    }
}

/// Aggregate result of one diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnoseResult {
    /// The problem text exactly as supplied.
    pub problem: String,

    /// Category assigned by the classifier.
    pub category: ProblemCategory,

    /// Executed stages in execution order.
    pub stages: Vec<StageResult>,

    /// Wall-clock start of the diagnosis.
    pub started_at: DateTime<Utc>,

    /// Total elapsed time across all stages in milliseconds.
    pub duration_ms: u64,
}

impl DiagnoseResult {
    /// Number of stages whose model call succeeded.
    pub fn succeeded_count(&self) -> usize {
        self.stages.iter().filter(|s| s.succeeded()).count()
    }

    /// Number of stages that recorded an error marker.
    pub fn failed_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.succeeded()).count()
    }

    /// Stage identifiers in execution order.
    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage_id.as_str()).collect()
    }
}

/// Named stage budgets offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// A single stage.
    Quick,
    /// Three stages.
    #[default]
    Standard,
    /// Every stage in the registry.
    Deep,
}

impl Depth {
    pub fn stage_count(&self) -> usize {
        match self {
            Depth::Quick => 1,
            Depth::Standard => 3,
            Depth::Deep => REGISTRY_SIZE,
        }
    }
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Depth::Quick => "quick",
            Depth::Standard => "standard",
            Depth::Deep => "deep",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Depth::Quick),
            "standard" => Ok(Depth::Standard),
            "deep" => Ok(Depth::Deep),
            other => Err(format!("unknown depth: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stage(id: &str, response: StageResponse) -> StageResult {
        StageResult {
            stage_id: id.to_string(),
            model: "m".to_string(),
            role: "r".to_string(),
            chemistry: "c".to_string(),
            response,
            duration_ms: 10,
        }
    }

    #[test]
    fn test_result_counts() {
        let result = DiagnoseResult {
            problem: "p".to_string(),
            category: ProblemCategory::Unknown,
            stages: vec![
                stage("build", StageResponse::Success { body: json!({}) }),
                stage(
                    "dependency",
                    StageResponse::Failed {
                        model: "m".to_string(),
                        error: "down".to_string(),
                    },
                ),
            ],
            started_at: Utc::now(),
            duration_ms: 20,
        };

        assert_eq!(result.succeeded_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.stage_ids(), vec!["build", "dependency"]);
    }

    #[test]
    fn test_depth_stage_counts() {
        assert_eq!(Depth::Quick.stage_count(), 1);
        assert_eq!(Depth::Standard.stage_count(), 3);
        assert_eq!(Depth::Deep.stage_count(), 7);
        assert_eq!(Depth::default(), Depth::Standard);
    }

    #[test]
    fn test_depth_parse() {
        assert_eq!("quick".parse::<Depth>(), Ok(Depth::Quick));
        assert_eq!(" Deep ".parse::<Depth>(), Ok(Depth::Deep));
        assert!("bottomless".parse::<Depth>().is_err());
        assert_eq!(Depth::Standard.to_string(), "standard");
    }
}
