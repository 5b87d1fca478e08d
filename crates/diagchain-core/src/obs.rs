//! Structured observability hooks for the diagnosis lifecycle.
//!
//! This module provides:
//! - A diagnosis-scoped tracing span via the `DiagnosisSpan` RAII guard
//! - Emission functions for lifecycle events: start, stage completion or
//!   failure, and finish
//!
//! Events are emitted at `info!` level, stage failures at `warn!`. Filter with
//! `RUST_LOG` as usual.

use tracing::{info, warn};

use crate::classifier::ProblemCategory;

/// RAII guard that enters a diagnosis-scoped span.
///
/// Not held across `.await`; async code instruments its future with
/// [`diagnosis_span`] instead.
pub struct DiagnosisSpan {
    _span: tracing::span::EnteredSpan,
}

impl DiagnosisSpan {
    pub fn enter(diagnosis_id: &str) -> Self {
        Self {
            _span: diagnosis_span(diagnosis_id).entered(),
        }
    }
}

/// Span tagged with the diagnosis id.
pub fn diagnosis_span(diagnosis_id: &str) -> tracing::Span {
    tracing::info_span!("diagchain.diagnosis", diagnosis_id = %diagnosis_id)
}

pub fn emit_diagnosis_started(category: ProblemCategory, start_index: usize, planned: usize) {
    info!(
        event = "diagnosis.started",
        category = %category,
        start_index = start_index,
        planned_stages = planned,
    );
}

pub fn emit_stage_completed(stage_id: &str, model: &str, duration_ms: u64) {
    info!(
        event = "stage.completed",
        stage = %stage_id,
        model = %model,
        duration_ms = duration_ms,
    );
}

/// Stage failures are absorbed by the pipeline, so they are warnings.
pub fn emit_stage_failed(stage_id: &str, model: &str, error: &dyn std::fmt::Display) {
    warn!(event = "stage.failed", stage = %stage_id, model = %model, error = %error);
}

pub fn emit_diagnosis_finished(stages: usize, failures: usize, duration_ms: u64) {
    info!(
        event = "diagnosis.finished",
        stages = stages,
        failures = failures,
        duration_ms = duration_ms,
    );
}
