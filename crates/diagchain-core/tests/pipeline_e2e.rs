//! End-to-end pipeline tests against the in-memory model service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diagchain_core::fakes::StubInvoker;
use diagchain_core::{
    classify, plan, start_index, DiagnoseResult, Pipeline, ProblemCategory, StageResponse,
    REGISTRY_SIZE,
};
use serde_json::{json, Value};

fn pipeline(stub: StubInvoker) -> (Pipeline, Arc<StubInvoker>) {
    let stub = Arc::new(stub);
    (Pipeline::new(stub.clone()), stub)
}

/// Clear timing fields so two runs can be compared structurally.
fn without_timing(mut result: DiagnoseResult) -> DiagnoseResult {
    result.started_at = DateTime::<Utc>::UNIX_EPOCH;
    result.duration_ms = 0;
    for stage in &mut result.stages {
        stage.duration_ms = 0;
    }
    result
}

#[tokio::test]
async fn quick_diagnose_syntax_problem() {
    let problem = "Unexpected token '>' in JSX";
    assert_eq!(classify(problem), ProblemCategory::Syntax);
    assert_eq!(start_index(ProblemCategory::Syntax), 0);

    let (pipeline, stub) = pipeline(StubInvoker::new());
    let result = pipeline.quick_diagnose(problem).await;

    assert_eq!(result.problem, problem);
    assert_eq!(result.category, ProblemCategory::Syntax);
    assert_eq!(result.stages.len(), 1);
    assert_eq!(result.stages[0].role, "Syntax Specialist");
    assert_eq!(result.stages[0].model, "falcon:7b");
    assert_eq!(stub.calls()[0].0, "falcon:7b");
}

#[tokio::test]
async fn dependency_problem_starts_at_coordinator() {
    let problem = "Module not found: cannot find module 'foo'";
    let (pipeline, _stub) = pipeline(StubInvoker::new());
    let result = pipeline.quick_diagnose(problem).await;

    assert_eq!(result.category, ProblemCategory::Dependency);
    assert_eq!(plan(problem, 1).start_index, 3);
    assert_eq!(result.stages[0].role, "Dependency Coordinator");
}

#[tokio::test]
async fn stage_counts_follow_budget() {
    let (pipeline, _stub) = pipeline(StubInvoker::new());

    assert_eq!(pipeline.run("tsc fails", 1).await.stages.len(), 1);
    assert_eq!(pipeline.standard_diagnose("tsc fails").await.stages.len(), 3);
    assert_eq!(pipeline.deep_diagnose("tsc fails").await.stages.len(), 7);
    assert_eq!(pipeline.run("tsc fails", 12).await.stages.len(), REGISTRY_SIZE);
}

#[tokio::test]
async fn deep_dependency_run_wraps_around_registry() {
    let (pipeline, stub) = pipeline(StubInvoker::new());
    let result = pipeline
        .deep_diagnose("Module not found: cannot find module 'foo'")
        .await;

    assert_eq!(
        result.stage_ids(),
        vec![
            "dependency",
            "architecture",
            "review",
            "synthesis",
            "syntax",
            "types",
            "build"
        ]
    );
    let models: Vec<String> = stub.calls().into_iter().map(|(m, _)| m).collect();
    let expected: Vec<String> = result.stages.iter().map(|s| s.model.clone()).collect();
    assert_eq!(models, expected);
}

#[tokio::test]
async fn failed_stage_does_not_abort_pipeline() {
    // Syntax problem, standard depth: syntax -> types -> build. Fail the middle one.
    let (pipeline, stub) = pipeline(StubInvoker::new().failing("qwen2.5-coder:7b"));
    let result = pipeline
        .standard_diagnose("Unexpected token ';'")
        .await;

    assert_eq!(result.stages.len(), 3);
    assert!(result.stages[0].succeeded());
    assert!(result.stages[2].succeeded());
    assert_eq!(result.failed_count(), 1);

    match &result.stages[1].response {
        StageResponse::Failed { model, error } => {
            assert_eq!(model, "qwen2.5-coder:7b");
            assert!(error.contains("stub refused connection"));
        }
        other => panic!("expected failure marker, got {:?}", other),
    }

    // The marker is folded into the next stage's context.
    let third_prompt = &stub.calls()[2].1;
    assert!(third_prompt.contains("--- Type System Analyst (qwen2.5-coder:7b) ---"));
    assert!(third_prompt.contains(r#""model":"qwen2.5-coder:7b""#));
}

#[tokio::test]
async fn every_stage_failing_still_returns_full_result() {
    let mut stub = StubInvoker::new();
    for stage in diagchain_core::stages() {
        stub = stub.failing(stage.model);
    }
    let (pipeline, _stub) = pipeline(stub);
    let result = pipeline.deep_diagnose("refactor the design").await;

    assert_eq!(result.stages.len(), REGISTRY_SIZE);
    assert_eq!(result.failed_count(), REGISTRY_SIZE);
    assert_eq!(result.succeeded_count(), 0);
}

#[tokio::test]
async fn context_accumulates_original_problem_and_prior_outputs() {
    let stub = StubInvoker::new()
        .with_response("llama3.2:3b", "first finding")
        .with_response("deepseek-coder:6.7b", "second finding");
    let (pipeline, stub) = pipeline(stub);

    let problem = "webpack build broke overnight";
    pipeline.standard_diagnose(problem).await;

    let calls = stub.calls();
    assert_eq!(calls.len(), 3);
    for (_, prompt) in &calls {
        assert!(prompt.contains(problem));
    }

    let expected_context = format!(
        "{problem}\n\n--- Build Fast Responder (llama3.2:3b) ---\nfirst finding\
         \n\n--- Dependency Coordinator (deepseek-coder:6.7b) ---\nsecond finding"
    );
    assert!(calls[2].1.contains(&expected_context));
    assert!(calls[2].1.contains("- Build Fast Responder (llama3.2:3b): first finding"));
    assert!(!calls[0].1.contains("Do not duplicate"));
}

#[tokio::test]
async fn raw_response_without_text_field_is_serialized() {
    let body: Value = json!({ "choices": ["a", "b"] });
    let stub = StubInvoker::new().with_raw_response("llama3.2:3b", body.clone());
    let (pipeline, stub) = pipeline(stub);

    let result = pipeline.run("something odd happened", 2).await;
    assert_eq!(result.stages[0].response_text(), body.to_string());
    assert!(stub.calls()[1].1.contains(&body.to_string()));
}

#[tokio::test]
async fn identical_inputs_produce_identical_results() {
    let stub = StubInvoker::new().with_response("deepseek-r1:8b", "split the module");
    let (pipeline, _stub) = pipeline(stub);

    let a = pipeline.deep_diagnose("circular dependency in design").await;
    let b = pipeline.deep_diagnose("circular dependency in design").await;
    assert_eq!(without_timing(a), without_timing(b));
}

#[tokio::test]
async fn concurrent_runs_keep_independent_state() {
    let (pipeline, _stub) = pipeline(StubInvoker::new());

    let (syntax, deps) = tokio::join!(
        pipeline.standard_diagnose("Unterminated string literal"),
        pipeline.deep_diagnose("peer dep conflict on react"),
    );

    assert_eq!(syntax.category, ProblemCategory::Syntax);
    assert_eq!(syntax.stage_ids(), vec!["syntax", "types", "build"]);
    assert_eq!(deps.category, ProblemCategory::Dependency);
    assert_eq!(deps.stages.len(), REGISTRY_SIZE);
    assert_eq!(deps.stage_ids()[0], "dependency");
}

#[tokio::test]
async fn unknown_problem_defaults_to_fast_stage() {
    let (pipeline, _stub) = pipeline(StubInvoker::new());
    let result = pipeline.quick_diagnose("").await;

    assert_eq!(result.category, ProblemCategory::Unknown);
    assert_eq!(result.stage_ids(), vec!["build"]);
}
