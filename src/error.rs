//! Error taxonomy for build passes
//!
//! Task-local failures (`ConfigurationError`, `ReadError`, `EngineError`) are
//! captured as task outcomes on the worker threads and never cross a task
//! boundary as a panic. After the pool drains, exactly one of them is surfaced
//! to the caller as a [`BuildError`]. Causes are shared through `Arc` so the
//! error a caller receives is the same object the worker recorded.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::engine::EngineFault;
use crate::resource::DecodeError;

/// Engine construction failed.
///
/// A worker that hits this caches it and reports it for every task it runs
/// afterwards, without trying to construct the engine again.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to open custom library {}", .path.display())]
    CustomLibOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read rule library")]
    LibraryRead(#[source] io::Error),

    #[error("malformed rule library")]
    LibraryParse(#[source] toml::de::Error),

    #[error("invalid pattern for rule '{rule}'")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid value '{value}' for engine option '{key}': {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown engine option '{0}'")]
    UnknownOption(String),
}

/// A file's content could not be read or decoded.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read resource {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {} as {charset}", .path.display())]
    Decode {
        path: PathBuf,
        charset: String,
        #[source]
        source: DecodeError,
    },
}

impl ReadError {
    /// Path of the resource that could not be read
    pub fn path(&self) -> &Path {
        match self {
            ReadError::Io { path, .. } | ReadError::Decode { path, .. } => path,
        }
    }
}

/// The engine failed while checking a file.
///
/// Problems found in the file are not errors; they go to the problem handler.
#[derive(Debug, Error)]
#[error("failed checking file {}", .path.display())]
pub struct EngineError {
    pub path: PathBuf,
    #[source]
    pub source: EngineFault,
}

/// The task pool itself failed.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),

    #[error("task pool was interrupted: {0}")]
    Interrupted(String),

    #[error("task pool did not drain within {0:?}")]
    DrainTimeout(Duration),
}

/// The single failure surfaced by closing a build pass.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(Arc<ConfigurationError>),

    #[error(transparent)]
    Read(Arc<ReadError>),

    /// An engine failure or a panicking task, wrapped as a generic runtime failure
    #[error("{message}")]
    Runtime {
        message: String,
        #[source]
        cause: Option<Arc<EngineError>>,
    },

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
}
