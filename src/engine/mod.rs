//! Analysis engine interface
//!
//! An engine is stateful and not safe to share between threads. Every worker
//! builds its own through an [`EngineFactory`], from an optional rule library
//! stream and the project's engine options, and then reuses it for every file
//! that worker checks.

mod rules;

pub use rules::{RuleEngine, RuleEngineFactory};

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigurationError;
use crate::resource::Text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A problem reported by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// 1-based line number
    pub line: usize,
    /// 1-based column
    pub character: usize,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

/// Receives problems as the engine finds them
pub trait ProblemHandler {
    fn handle_problem(&mut self, problem: Problem);
}

impl ProblemHandler for Vec<Problem> {
    fn handle_problem(&mut self, problem: Problem) {
        self.push(problem);
    }
}

/// The engine gave up on a file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFault {
    #[error("{0}")]
    Internal(String),
}

pub trait Engine {
    /// Check one file, reporting each problem to `handler`
    fn check(&mut self, text: &Text, handler: &mut dyn ProblemHandler) -> Result<(), EngineFault>;
}

/// Builds engines on worker threads
pub trait EngineFactory: Send + Sync {
    /// Create an engine from an optional rule library and the engine options.
    ///
    /// `library` is owned and closed by the caller.
    fn create(
        &self,
        library: Option<&mut dyn Read>,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn Engine>, ConfigurationError>;
}

/// Inputs for engine construction, resolved once per build pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Custom rule library replacing the built-in one
    pub custom_lib: Option<PathBuf>,
    pub options: BTreeMap<String, String>,
}
