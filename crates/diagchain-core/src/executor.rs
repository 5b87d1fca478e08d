//! Sequential stage execution with context accumulation.
//!
//! A diagnosis is a linear walk over the registry: classify, pick a start
//! index, then run up to `max_stages` stages, wrapping around the end of the
//! registry. Each stage sees the original problem plus every earlier stage's
//! output. A failed model call is recorded as that stage's response and the
//! walk continues; there are no retries and no early exit.
//!
//! The [`ModelInvoker`] is injected so tests can supply a deterministic stub.
//! Concurrent `run` calls on one [`Pipeline`] share only the invoker and the
//! read-only registry.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::classifier::{classify, ProblemCategory};
use crate::invoker::{ModelInvoker, StageResponse};
use crate::obs::{
    diagnosis_span, emit_diagnosis_finished, emit_diagnosis_started, emit_stage_completed,
    emit_stage_failed,
};
use crate::prompt::build_prompt;
use crate::registry::{stage_at, stages, start_index, StageDescriptor, REGISTRY_SIZE};
use crate::result::{Depth, DiagnoseResult, StageResult};

/// The ordered stage walk for one problem, computed without calling any model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub problem: String,
    pub category: ProblemCategory,
    pub start_index: usize,
    /// Registry indices in execution order.
    pub stage_indices: Vec<usize>,
}

impl ExecutionPlan {
    /// Descriptors in execution order.
    pub fn stages(&self) -> impl Iterator<Item = &'static StageDescriptor> + '_ {
        self.stage_indices.iter().filter_map(|&i| stage_at(i))
    }

    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.stage_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stage_indices.is_empty()
    }
}

/// Clamp a caller stage budget to `1..=REGISTRY_SIZE`.
pub fn effective_stage_count(max_stages: usize) -> usize {
    max_stages.clamp(1, REGISTRY_SIZE)
}

/// Compute the stage walk for `problem`.
///
/// Stages wrap circularly from the start index. The budget is capped at the
/// registry size, so no stage is visited twice.
pub fn plan(problem: &str, max_stages: usize) -> ExecutionPlan {
    let category = classify(problem);
    let start = start_index(category);
    let stage_indices = (0..effective_stage_count(max_stages))
        .map(|i| (start + i) % REGISTRY_SIZE)
        .collect();

    ExecutionPlan {
        problem: problem.to_string(),
        category,
        start_index: start,
        stage_indices,
    }
}

/// Diagnosis pipeline over the static stage registry.
#[derive(Clone)]
pub struct Pipeline {
    invoker: Arc<dyn ModelInvoker>,
}

impl Pipeline {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self { invoker }
    }

    /// Read-only view of the stage registry.
    pub fn registry(&self) -> &'static [StageDescriptor] {
        stages()
    }

    /// Run up to `max_stages` stages for `problem`.
    ///
    /// Always returns a result; model failures are recorded per stage.
    pub async fn run(&self, problem: &str, max_stages: usize) -> DiagnoseResult {
        let diagnosis_id = Uuid::new_v4().to_string();
        self.execute(plan(problem, max_stages))
            .instrument(diagnosis_span(&diagnosis_id))
            .await
    }

    pub async fn diagnose(&self, problem: &str, depth: Depth) -> DiagnoseResult {
        self.run(problem, depth.stage_count()).await
    }

    pub async fn quick_diagnose(&self, problem: &str) -> DiagnoseResult {
        self.diagnose(problem, Depth::Quick).await
    }

    pub async fn standard_diagnose(&self, problem: &str) -> DiagnoseResult {
        self.diagnose(problem, Depth::Standard).await
    }

    pub async fn deep_diagnose(&self, problem: &str) -> DiagnoseResult {
        self.diagnose(problem, Depth::Deep).await
    }

    async fn execute(&self, plan: ExecutionPlan) -> DiagnoseResult {
        let started_at = Utc::now();
        let start = Instant::now();

        emit_diagnosis_started(plan.category, plan.start_index, plan.len());

        let mut context = plan.problem.clone();
        let mut results: Vec<StageResult> = Vec::with_capacity(plan.len());

        for stage in plan.stages() {
            let step_start = Instant::now();
            let prompt = build_prompt(stage, &context, &results);
            debug!(stage = %stage.id, prompt_chars = prompt.len(), "invoking model");

            let response = match self.invoker.generate(stage.model, &prompt).await {
                Ok(body) => StageResponse::Success { body },
                Err(e) => {
                    emit_stage_failed(stage.id, stage.model, &e);
                    StageResponse::Failed {
                        model: stage.model.to_string(),
                        error: e.to_string(),
                    }
                }
            };

            let duration_ms = step_start.elapsed().as_millis() as u64;
            if response.is_success() {
                emit_stage_completed(stage.id, stage.model, duration_ms);
            }

            context.push_str(&format!(
                "\n\n--- {} ({}) ---\n{}",
                stage.role,
                stage.model,
                response.text()
            ));

            results.push(StageResult {
                stage_id: stage.id.to_string(),
                model: stage.model.to_string(),
                role: stage.role.to_string(),
                chemistry: stage.chemistry.to_string(),
                response,
                duration_ms,
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let failures = results.iter().filter(|r| !r.succeeded()).count();
        emit_diagnosis_finished(results.len(), failures, duration_ms);

        DiagnoseResult {
            problem: plan.problem,
            category: plan.category,
            stages: results,
            started_at,
            duration_ms,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &REGISTRY_SIZE)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StubInvoker;

    #[test]
    fn test_plan_syntax_three_stages() {
        let plan = plan("Unexpected token '>' in JSX", 3);
        assert_eq!(plan.category, ProblemCategory::Syntax);
        assert_eq!(plan.start_index, 0);
        assert_eq!(plan.stage_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_plan_wraps_around_registry() {
        let plan = plan("Module not found: cannot find module 'foo'", 7);
        assert_eq!(plan.category, ProblemCategory::Dependency);
        assert_eq!(plan.stage_indices, vec![3, 4, 5, 6, 0, 1, 2]);
    }

    #[test]
    fn test_plan_caps_budget_at_registry_size() {
        let plan = plan("refactor the design", 50);
        assert_eq!(plan.len(), REGISTRY_SIZE);
        let mut sorted = plan.stage_indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..REGISTRY_SIZE).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_budget_runs_one_stage() {
        assert_eq!(effective_stage_count(0), 1);
        assert_eq!(plan("anything", 0).len(), 1);
    }

    #[test]
    fn test_unknown_plan_starts_at_fast_stage() {
        let plan = plan("", 1);
        assert_eq!(plan.category, ProblemCategory::Unknown);
        assert_eq!(plan.stage_ids(), vec!["build"]);
    }

    #[tokio::test]
    async fn test_run_appends_rendered_responses_to_context() {
        let stub = Arc::new(StubInvoker::new().with_response("falcon:7b", "fix the brace"));
        let pipeline = Pipeline::new(stub.clone());

        let result = pipeline.run("Unexpected token '}'", 2).await;
        assert_eq!(result.stages.len(), 2);

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "qwen2.5-coder:7b");
        assert!(calls[1]
            .1
            .contains("Unexpected token '}'\n\n--- Syntax Specialist (falcon:7b) ---\nfix the brace"));
    }

    #[tokio::test]
    async fn test_pipeline_debug_does_not_expose_invoker() {
        let pipeline = Pipeline::new(Arc::new(StubInvoker::new()));
        assert!(format!("{pipeline:?}").contains("Pipeline"));
        assert_eq!(pipeline.registry().len(), REGISTRY_SIZE);
    }
}
