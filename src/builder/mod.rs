//! Build passes: parallel checking of a project's files
//!
//! A [`BuildPass`] is opened for one project, fed resources by a walker
//! ([`walk_tree`](crate::resource::walk_tree) for a full build,
//! [`walk_delta`](crate::resource::walk_delta) for an incremental one) and
//! closed once the walk is done.
//!
//! ```text
//! walker ──visit──▶ BuildPass ──submit──▶ TaskPool ──run──▶ CheckTask
//!  (caller thread)   clear diagnostics      N workers        engine per worker
//!                                                             │
//! close() ◀── reconcile ◀── outcomes in submission order ◀────┘
//! ```
//!
//! Traversal is sequential on the caller's thread; only the per-file checks
//! run on the pool. Closing drains the pool and reports at most one failure.

mod cancel;
mod engine_cache;
mod failure;
mod selector;
mod task;
mod visitor;

pub use cancel::CancellationToken;
pub use engine_cache::{EngineCache, EngineSlot};
pub use failure::reconcile;
pub use selector::{ResourceSelector, SelectionPolicy};
pub use task::{CheckTask, FailureKind, TaskFailure, TaskOutcome};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::diagnostics::DiagnosticSink;
use crate::engine::{EngineFactory, EngineSettings};
use crate::error::{BuildError, OrchestrationError};
use crate::parallel::{
    Completion, Drained, NoProgress, ProgressCounter, ProgressReporter, ProgressSnapshot,
    TaskPool, calculate_optimal_workers,
};
use crate::resource::ResourceRef;
use task::{TaskContext, Worker};

/// Upper bound on draining the pool, long enough to never matter in practice
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// The unit a build pass checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    root: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// A project named after its root folder
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collaborators and limits of a build pass
pub struct BuildOptions {
    selector: Arc<dyn SelectionPolicy>,
    engine_factory: Arc<dyn EngineFactory>,
    sink: Arc<dyn DiagnosticSink>,
    settings: EngineSettings,
    reporter: Arc<dyn ProgressReporter>,
    workers: usize,
    drain_timeout: Duration,
}

impl BuildOptions {
    pub fn new(
        selector: Arc<dyn SelectionPolicy>,
        engine_factory: Arc<dyn EngineFactory>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            selector,
            engine_factory,
            sink,
            settings: EngineSettings::default(),
            reporter: Arc::new(NoProgress),
            workers: calculate_optimal_workers(0, 100),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}

/// Totals of a build pass that closed without failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Check tasks submitted
    pub started: usize,
    /// Check tasks that ran to completion
    pub completed: usize,
    /// Whether the pass was cancelled
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// One parallel check of a project, from `open` to `close`
pub struct BuildPass {
    project: Project,
    selector: Arc<dyn SelectionPolicy>,
    context: Arc<TaskContext>,
    pool: TaskPool<Worker, TaskOutcome>,
    submitted: Vec<PathBuf>,
    drain_timeout: Duration,
    started_at: Instant,
}

impl BuildPass {
    /// Start the worker pool for `project`
    pub fn open(
        project: Project,
        options: BuildOptions,
        cancel: CancellationToken,
    ) -> Result<Self, BuildError> {
        let eligible = options.selector.is_project_eligible();
        info!(
            "Opening build pass for {} with {} workers",
            project.name(),
            options.workers
        );
        if !eligible {
            debug!("Project {} is not eligible for checking", project.name());
        }

        let context = Arc::new(TaskContext {
            engines: EngineCache::new(options.engine_factory, options.settings, eligible),
            sink: options.sink,
            progress: ProgressCounter::new(),
            reporter: options.reporter,
            cancel,
        });
        let pool = TaskPool::new(options.workers, Worker::new)?;

        Ok(Self {
            project,
            selector: options.selector,
            context,
            pool,
            submitted: Vec::new(),
            drain_timeout: options.drain_timeout,
            started_at: Instant::now(),
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Advisory started/completed counts
    pub fn progress(&self) -> ProgressSnapshot {
        self.context.progress.snapshot()
    }

    pub fn is_cancelled(&self) -> bool {
        self.context.cancel.is_cancelled()
    }

    fn submit(&mut self, resource: ResourceRef) -> Result<(), OrchestrationError> {
        let task = CheckTask::new(resource, self.submitted.len());
        let path = task.path().to_path_buf();
        debug!("Submitting check of {}", path.display());

        self.context.progress.increment_started();
        let context = Arc::clone(&self.context);
        self.pool
            .submit(move |worker: &mut Worker| task.run(&context, worker))?;
        self.submitted.push(path);
        Ok(())
    }

    /// Stop accepting work, wait for every submitted check and report the
    /// first failure by priority.
    pub fn close(self) -> Result<BuildSummary, BuildError> {
        let Drained {
            completions,
            interruption,
        } = self.pool.drain(self.drain_timeout);

        let cancelled = self.context.cancel.is_cancelled();
        if matches!(interruption, Some(OrchestrationError::DrainTimeout(_))) {
            // Tasks still queued behind the deadline must not touch the sink
            self.context.cancel.cancel();
        }

        let outcomes: Vec<TaskOutcome> = completions
            .into_iter()
            .zip(&self.submitted)
            .map(|(completion, path)| match completion {
                Completion::Finished(outcome) => outcome,
                Completion::Panicked(message) => TaskOutcome::Failed(TaskFailure::Panicked {
                    path: path.clone(),
                    message,
                }),
                // Covered by the interruption
                Completion::Lost => TaskOutcome::Cancelled,
            })
            .collect();

        self.context.reporter.finish();

        let progress = self.context.progress.snapshot();
        let elapsed = self.started_at.elapsed();
        info!(
            "Build pass for {} checked {} of {} files in {:.2?}{}",
            self.project.name(),
            progress.completed,
            progress.started,
            elapsed,
            if cancelled { " (cancelled)" } else { "" }
        );

        reconcile(&outcomes, interruption)?;

        Ok(BuildSummary {
            started: progress.started,
            completed: progress.completed,
            cancelled,
            elapsed,
        })
    }
}
