//! diagchain - staged diagnosis CLI
//!
//! Routes a problem description through the specialist stage chain, each
//! stage answered by a local Ollama model.
//!
//! ## Commands
//!
//! - `diagnose`: Run the pipeline and print the findings
//! - `plan`: Show which stages would run, without calling any model
//! - `classify`: Show the category assigned to a problem
//! - `roster`: List every stage in the registry

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use diagchain_core::{
    classify, plan, render_report_md, render_roster_md, start_index, stages, write_report_json,
    Depth, DiagnoseResult, Pipeline, StageResponse,
};
use diagchain_ollama::{OllamaClient, OllamaConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "diagchain")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Staged code-problem diagnosis over local models", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Ollama server URL
    #[arg(long, global = true, env = "OLLAMA_HOST", default_value = DEFAULT_BASE_URL)]
    ollama_url: String,

    /// Per-request timeout for model calls in seconds (0 disables it)
    #[arg(long, global = true, env = "DIAGCHAIN_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose a problem by running the stage pipeline
    Diagnose {
        /// Problem description (error output, symptoms, question)
        #[arg(required = true, num_args = 1..)]
        problem: Vec<String>,

        /// Named depth: quick (1 stage), standard (3), deep (7)
        #[arg(short, long, default_value = "standard", conflicts_with = "stages")]
        depth: Depth,

        /// Explicit stage budget, capped at the registry size
        #[arg(short, long)]
        stages: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write the full result as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort the whole diagnosis after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Keep-alive hint passed to Ollama (e.g. "10m")
        #[arg(long, env = "DIAGCHAIN_KEEP_ALIVE")]
        keep_alive: Option<String>,
    },

    /// Show the stage walk for a problem without calling any model
    Plan {
        /// Problem description
        #[arg(required = true, num_args = 1..)]
        problem: Vec<String>,

        /// Stage budget
        #[arg(short, long, default_value = "3")]
        stages: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Classify a problem description
    Classify {
        /// Problem description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List the stage roster
    Roster {
        /// Query the Ollama server and mark which stage models are installed
        #[arg(long)]
        check: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Serialize)]
struct Classification<'a> {
    text: &'a str,
    category: String,
    start_index: usize,
    start_stage: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    diagchain_core::init_tracing(cli.json, level);

    let base_config =
        OllamaConfig::new(&cli.ollama_url).with_timeout_secs(cli.request_timeout_secs);

    match cli.command {
        Commands::Diagnose {
            problem,
            depth,
            stages,
            format,
            output,
            timeout_secs,
            keep_alive,
        } => {
            let config = match keep_alive {
                Some(k) => base_config.with_keep_alive(&k),
                None => base_config,
            };
            cmd_diagnose(
                config,
                &problem.join(" "),
                resolve_stage_count(depth, stages),
                format,
                output.as_deref(),
                timeout_secs,
            )
            .await
        }
        Commands::Plan {
            problem,
            stages,
            format,
        } => cmd_plan(&problem.join(" "), stages, format),
        Commands::Classify { text } => cmd_classify(&text.join(" ")),
        Commands::Roster { check, format } => cmd_roster(base_config, check, format).await,
    }
}

/// Explicit `--stages` wins over the named depth.
fn resolve_stage_count(depth: Depth, stages: Option<usize>) -> usize {
    stages.unwrap_or_else(|| depth.stage_count())
}

/// Run the pipeline against Ollama and print the result
async fn cmd_diagnose(
    config: OllamaConfig,
    problem: &str,
    max_stages: usize,
    format: OutputFormat,
    output: Option<&std::path::Path>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let client = OllamaClient::new(config).context("Failed to create Ollama client")?;
    let pipeline = Pipeline::new(Arc::new(client));

    info!(max_stages, "Starting diagnosis");

    let result = match timeout_secs {
        Some(secs) => tokio::time::timeout(
            Duration::from_secs(secs),
            pipeline.run(problem, max_stages),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Diagnosis timed out after {} seconds", secs))?,
        None => pipeline.run(problem, max_stages).await,
    };

    if let Some(path) = output {
        write_report_json(path, &result)?;
        info!(path = ?path, "Wrote diagnosis report");
    }

    match format {
        OutputFormat::Text => print!("{}", render_text(&result)),
        OutputFormat::Markdown => print!("{}", render_report_md(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

fn render_text(result: &DiagnoseResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Category: {}\n", result.category));
    out.push_str(&format!(
        "Stages: {} ({} failed)\n",
        result.stages.len(),
        result.failed_count()
    ));
    out.push_str(&format!("Duration: {}ms\n\n", result.duration_ms));

    for stage in &result.stages {
        let status = if stage.succeeded() { "✓" } else { "✗" };
        out.push_str(&format!(
            "  {} {} ({}, {}ms)\n",
            status, stage.role, stage.model, stage.duration_ms
        ));
        let body = match &stage.response {
            StageResponse::Success { .. } => stage.response_text(),
            StageResponse::Failed { error, .. } => format!("error: {}", error),
        };
        for line in body.trim().lines() {
            out.push_str(&format!("    {}\n", line));
        }
        out.push('\n');
    }
    out
}

/// Print the stage walk for a problem
fn cmd_plan(problem: &str, max_stages: usize, format: OutputFormat) -> Result<()> {
    let plan = plan(problem, max_stages);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("Category: {}", plan.category);
            println!("Start index: {}", plan.start_index);
            println!();
            for (step, stage) in plan.stages().enumerate() {
                println!("  {}. {} ({})", step + 1, stage.role, stage.model);
            }
        }
    }
    Ok(())
}

/// Print the category for a problem
fn cmd_classify(text: &str) -> Result<()> {
    let category = classify(text);
    let index = start_index(category);
    let start_stage = diagchain_core::stage_at(index)
        .map(|s| s.id)
        .unwrap_or("unknown");

    let classification = Classification {
        text,
        category: category.to_string(),
        start_index: index,
        start_stage,
    };
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

/// Print the stage roster, optionally checking installed models
async fn cmd_roster(config: OllamaConfig, check: bool, format: OutputFormat) -> Result<()> {
    let installed = if check {
        let client = OllamaClient::new(config).context("Failed to create Ollama client")?;
        Some(
            client
                .list_models()
                .await
                .context("Failed to list models from Ollama")?,
        )
    } else {
        None
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stages())?),
        OutputFormat::Markdown => print!("{}", render_roster_md(stages(), installed.as_deref())),
        OutputFormat::Text => {
            for (i, stage) in stages().iter().enumerate() {
                let marker = match &installed {
                    Some(models) if models.iter().any(|m| m == stage.model) => "✓ ",
                    Some(_) => "✗ ",
                    None => "",
                };
                println!(
                    "{}{}. {:<24} {:<22} {}",
                    marker, i, stage.role, stage.model, stage.chemistry
                );
            }
        }
    }
    Ok(())
}
