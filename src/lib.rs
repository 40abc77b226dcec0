//! # lintpass - parallel, incremental checking of project files
//!
//! lintpass walks a project (or just the files that changed), clears each
//! file's old diagnostics and checks it again on a fixed pool of worker
//! threads. Every worker builds its own analysis engine once and reuses it.
//! When the pass is closed, the pool is drained and at most one failure is
//! reported, picked by priority.
//!
//! ## Features
//!
//! - **Parallel**: one engine per worker thread, built lazily and never shared
//! - **Incremental**: check only the files in a change set, clearing diagnostics of removed files
//! - **Cancellable**: a shared token stops traversal and skips queued checks
//! - **Layered configuration**: defaults, user config, project config, `--config` and `LINTPASS_*` variables
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the current project
//! lintpass check
//!
//! # Check only what changed
//! lintpass check --changed src/app.js,src/lib/util.js
//!
//! # Show the merged configuration
//! lintpass config show
//! ```
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use lintpass::builder::{BuildOptions, BuildPass, CancellationToken, Project, ResourceSelector};
//! use lintpass::config::LintpassConfig;
//! use lintpass::diagnostics::MemorySink;
//! use lintpass::engine::RuleEngineFactory;
//! use lintpass::resource::walk_tree;
//!
//! # fn main() -> lintpass::Result<()> {
//! let root = Path::new("my-project");
//! let config = LintpassConfig::load(root)?;
//! let sink = Arc::new(MemorySink::new());
//!
//! let options = BuildOptions::new(
//!     Arc::new(ResourceSelector::new(root, &config.builder)?),
//!     Arc::new(RuleEngineFactory),
//!     sink.clone(),
//! )
//! .with_settings(config.engine_settings(root));
//!
//! let mut pass = BuildPass::open(Project::from_root(root), options, CancellationToken::new())?;
//! walk_tree(root, &config.builder.charset, &mut pass)?;
//! let summary = pass.close()?;
//! println!("checked {} files", summary.completed);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod parallel;
pub mod resource;
pub mod shared;

pub use builder::{BuildPass, BuildSummary, CancellationToken, Project};
pub use cli::{Cli, Output};
pub use config::LintpassConfig;
pub use error::BuildError;

/// Result type alias for lintpass operations
pub type Result<T> = anyhow::Result<T>;
