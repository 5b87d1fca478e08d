//! diagchain Core Library
//!
//! Routes a problem description through an ordered chain of specialist
//! stages, each backed by its own inference model:
//!
//! - [`registry`]: the fixed seven-stage catalog and category routing table
//! - [`classifier`]: keyword classification into a [`ProblemCategory`]
//! - [`prompt`]: per-stage prompt rendering
//! - [`executor`]: the sequential [`Pipeline`]
//! - [`invoker`]: the [`ModelInvoker`] seam to the model service

pub mod classifier;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod invoker;
pub mod obs;
pub mod prompt;
pub mod registry;
pub mod report;
pub mod result;
pub mod telemetry;

pub use classifier::{classify, ProblemCategory};
pub use error::{InvokeError, InvokeResult};
pub use executor::{effective_stage_count, plan, ExecutionPlan, Pipeline};
pub use invoker::{extract_response_text, ModelInvoker, StageResponse};
pub use obs::{
    diagnosis_span, emit_diagnosis_finished, emit_diagnosis_started, emit_stage_completed,
    emit_stage_failed, DiagnosisSpan,
};
pub use prompt::{build_prompt, truncate_chars, CLOSING_INSTRUCTION, PRIOR_EXCERPT_CHARS};
pub use registry::{
    find_stage, stage_at, stages, start_index, StageDescriptor, DEFAULT_START_INDEX, REGISTRY_SIZE,
};
pub use report::{render_report_md, render_roster_md, write_report_json};
pub use result::{Depth, DiagnoseResult, StageResult};
pub use telemetry::init_tracing;
