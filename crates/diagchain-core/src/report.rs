use anyhow::{Context, Result};
use std::path::Path;

use crate::invoker::StageResponse;
use crate::registry::StageDescriptor;
use crate::result::DiagnoseResult;

/// Write a diagnosis as pretty JSON.
pub fn write_report_json(path: &Path, result: &DiagnoseResult) -> Result<()> {
    let content = serde_json::to_string_pretty(result).context("serialize diagnosis")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a Markdown summary of a diagnosis for chat or PR output.
pub fn render_report_md(result: &DiagnoseResult) -> String {
    let mut out = String::new();
    out.push_str("# Diagnosis\n\n");
    out.push_str(&format!(
        "- category: `{}`\n- stages: {} ({} failed)\n- total: {}ms\n\n",
        result.category,
        result.stages.len(),
        result.failed_count(),
        result.duration_ms
    ));

    out.push_str("## Problem\n");
    out.push_str(&format!("```\n{}\n```\n\n", result.problem));

    for (i, stage) in result.stages.iter().enumerate() {
        out.push_str(&format!(
            "## {}. {} (`{}`)\n_{}_ · {}ms\n\n",
            i + 1,
            stage.role,
            stage.model,
            stage.chemistry,
            stage.duration_ms
        ));
        match &stage.response {
            StageResponse::Success { .. } => {
                out.push_str(stage.response_text().trim());
                out.push_str("\n\n");
            }
            StageResponse::Failed { error, .. } => {
                out.push_str(&format!("**failed:** {}\n\n", error));
            }
        }
    }
    out
}

/// Render the stage roster as Markdown.
///
/// `installed` marks stages whose model is known to be available; pass `None`
/// when availability was not checked.
pub fn render_roster_md(stages: &[StageDescriptor], installed: Option<&[String]>) -> String {
    let mut out = String::new();
    out.push_str("# Stage Roster\n\n");
    for (i, stage) in stages.iter().enumerate() {
        let marker = match installed {
            Some(models) if models.iter().any(|m| m == stage.model) => " ✓",
            Some(_) => " ✗",
            None => "",
        };
        out.push_str(&format!(
            "## {}. {} (`{}`){}\n",
            i, stage.role, stage.model, marker
        ));
        out.push_str(&format!(
            "- id: `{}`\n- trigger: {}\n- output: `{}`\n- chemistry: {}\n",
            stage.id, stage.trigger, stage.output, stage.chemistry
        ));
        out.push_str("- tasks:\n");
        for task in stage.tasks {
            out.push_str(&format!("  - {}\n", task));
        }
        out.push('\n');
    }
    out
}
