use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::{
    BuildOptions, BuildPass, BuildSummary, CancellationToken, Project, ResourceSelector,
};
use crate::cli::{EXIT_CLEAN, EXIT_DIAGNOSTICS, EXIT_FAILURE, Output};
use crate::config::LintpassConfig;
use crate::diagnostics::{Diagnostic, MemorySink};
use crate::engine::{RuleEngineFactory, Severity};
use crate::error::BuildError;
use crate::parallel::{ProgressReporter, SpinnerProgress, TracingProgress};
use crate::resource::{ResourceDelta, walk_delta, walk_tree};
use crate::shared::glob::expand_file_patterns;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project root to check
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Only check these changed files, relative to the project root (glob patterns allowed)
    #[arg(long, value_delimiter = ',')]
    pub changed: Vec<String>,

    /// Number of worker threads (defaults to the configured thread limits)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Serialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct JsonSummary {
    started: usize,
    completed: usize,
    cancelled: bool,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonFile<'a>>,
    summary: Option<JsonSummary>,
    error: Option<String>,
}

pub fn execute(args: CheckArgs, config_path: Option<&Path>, output: &Output) -> Result<i32> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Project path {} not found", args.path.display()))?;

    let config = LintpassConfig::load_with_custom_config(&root, config_path)?;
    let selector = ResourceSelector::new(&root, &config.builder)
        .context("Invalid file selection patterns in configuration")?;
    let sink = Arc::new(MemorySink::new());
    let workers = args.threads.unwrap_or_else(|| config.worker_count());

    let reporter: Arc<dyn ProgressReporter> = if args.format == OutputFormat::Text
        && !output.is_quiet()
        && console::Term::stderr().is_term()
    {
        Arc::new(SpinnerProgress::new())
    } else {
        Arc::new(TracingProgress)
    };

    let options = BuildOptions::new(Arc::new(selector), Arc::new(RuleEngineFactory), sink.clone())
        .with_settings(config.engine_settings(&root))
        .with_reporter(reporter)
        .with_workers(workers)
        .with_drain_timeout(config.drain_timeout());

    let charset = config.builder.charset.as_str();
    let changed = if args.changed.is_empty() {
        None
    } else {
        Some(expand_file_patterns(&args.changed, &root)?)
    };

    let mut pass = BuildPass::open(Project::from_root(&root), options, CancellationToken::new())?;
    let text = args.format == OutputFormat::Text;
    if text {
        output.verbose(&format!("Checking {} with {} workers", root.display(), workers));
    }

    let walked = match changed {
        None => walk_tree(&root, charset, &mut pass),
        Some(changed) => {
            if text {
                output.verbose(&format!("{} changed files", changed.len()));
            }
            let delta = ResourceDelta::from_changed_paths(&root, &changed, charset);
            walk_delta(&delta, &mut pass)
        }
    };

    // The pool is drained even when the walk stopped early
    let closed = pass.close();
    let result: Result<BuildSummary, BuildError> = match walked {
        Ok(()) => closed,
        Err(e) => Err(BuildError::from(e)),
    };

    let diagnostics = sink.snapshot();
    let errors = sink.count(Severity::Error);

    match args.format {
        OutputFormat::Json => {
            let report = JsonReport {
                files: diagnostics
                    .iter()
                    .map(|(path, diagnostics)| JsonFile {
                        path: display_path(&root, path),
                        diagnostics,
                    })
                    .collect(),
                summary: result.as_ref().ok().map(|summary| JsonSummary {
                    started: summary.started,
                    completed: summary.completed,
                    cancelled: summary.cancelled,
                    elapsed_ms: summary.elapsed.as_millis(),
                }),
                error: result.as_ref().err().map(error_chain),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for (path, diagnostics) in &diagnostics {
                output.file_header(&display_path(&root, path));
                for diagnostic in diagnostics {
                    output.diagnostic(diagnostic);
                }
            }
            output.blank_line();

            match &result {
                Ok(summary) => {
                    let warnings = sink.count(Severity::Warning);
                    let message = format!(
                        "Checked {} files in {:.2?}: {} errors, {} warnings",
                        summary.completed, summary.elapsed, errors, warnings
                    );
                    if summary.cancelled {
                        output.warning("Check was cancelled, results are partial");
                    }
                    if errors > 0 {
                        output.warning(&message);
                    } else {
                        output.success(&message);
                    }
                }
                Err(err) => output.error(&format!("Check failed: {}", error_chain(err))),
            }
        }
    }

    Ok(match result {
        Err(_) => EXIT_FAILURE,
        Ok(_) if errors > 0 => EXIT_DIAGNOSTICS,
        Ok(_) => EXIT_CLEAN,
    })
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// The error and its causes on one line
fn error_chain(err: &BuildError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
