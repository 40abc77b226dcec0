//! Configuration management for lintpass
//!
//! Configuration is layered with figment (see [`core`]) and extracted into the
//! typed structures below. Every field has a default, so partial files are fine.

pub mod core;

pub use self::core::LintpassConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Build pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Check files in this project at all
    pub enabled: bool,

    /// Upper bound on worker threads (0 = no limit)
    pub max_threads: usize,

    /// Share of CPU cores to use, 1-100
    pub thread_percentage: u8,

    /// Upper bound on draining the pool when a pass closes
    pub drain_timeout_secs: u64,

    /// Encoding assumed for file contents
    pub charset: String,

    pub include: Vec<String>,

    pub exclude: Vec<String>,

    pub exclude_folders: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_threads: 0,
            thread_percentage: 100,
            drain_timeout_secs: 24 * 60 * 60,
            charset: crate::resource::DEFAULT_CHARSET.to_string(),
            include: vec!["**/*.js".to_string()],
            exclude: Vec::new(),
            exclude_folders: Vec::new(),
        }
    }
}

/// Engine construction settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rule library replacing the built-in one; relative paths resolve
    /// against the project root
    pub custom_lib: Option<PathBuf>,

    /// Engine options; scalar values of any type are passed on as strings
    pub options: BTreeMap<String, serde_json::Value>,
}
