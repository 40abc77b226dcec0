use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use super::cancel::CancellationToken;
use super::engine_cache::{EngineCache, EngineSlot};
use crate::diagnostics::{DiagnosticSink, MarkerHandler};
use crate::error::{BuildError, ConfigurationError, EngineError, ReadError};
use crate::parallel::{ProgressCounter, ProgressReporter, WorkerId};
use crate::resource::{ResourceRef, read_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Configuration,
    Read,
    Engine,
    /// A panic inside the task
    Unexpected,
}

/// Why a check task failed
#[derive(Debug, Clone)]
pub enum TaskFailure {
    Configuration {
        path: PathBuf,
        error: Arc<ConfigurationError>,
    },
    Read(Arc<ReadError>),
    Engine(Arc<EngineError>),
    Panicked {
        path: PathBuf,
        message: String,
    },
}

impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskFailure::Configuration { .. } => FailureKind::Configuration,
            TaskFailure::Read(_) => FailureKind::Read,
            TaskFailure::Engine(_) => FailureKind::Engine,
            TaskFailure::Panicked { .. } => FailureKind::Unexpected,
        }
    }

    /// The file the failed task was checking
    pub fn path(&self) -> &Path {
        match self {
            TaskFailure::Configuration { path, .. } | TaskFailure::Panicked { path, .. } => path,
            TaskFailure::Read(err) => err.path(),
            TaskFailure::Engine(err) => &err.path,
        }
    }

    /// Surface the failure to the caller, keeping the original cause
    pub fn into_build_error(self) -> BuildError {
        match self {
            TaskFailure::Configuration { error, .. } => BuildError::Configuration(error),
            TaskFailure::Read(err) => BuildError::Read(err),
            TaskFailure::Engine(err) => BuildError::Runtime {
                message: "unexpected engine failure".to_string(),
                cause: Some(err),
            },
            TaskFailure::Panicked { path, message } => BuildError::Runtime {
                message: format!("check of {} panicked: {}", path.display(), message),
                cause: None,
            },
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Configuration { path, error } => {
                write!(f, "{}: {}", path.display(), error)
            }
            TaskFailure::Read(err) => write!(f, "{err}"),
            TaskFailure::Engine(err) => write!(f, "{err}"),
            TaskFailure::Panicked { path, message } => {
                write!(f, "{}: panicked: {}", path.display(), message)
            }
        }
    }
}

/// Result of one check task, produced exactly once per task
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Success,
    Cancelled,
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Per-worker state of a build pass
pub(crate) struct Worker {
    pub id: WorkerId,
    pub engine: EngineSlot,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            engine: EngineSlot::new(),
        }
    }
}

/// Everything a task needs besides its worker, shared by all tasks of a pass
pub(crate) struct TaskContext {
    pub engines: EngineCache,
    pub sink: Arc<dyn DiagnosticSink>,
    pub progress: ProgressCounter,
    pub reporter: Arc<dyn ProgressReporter>,
    pub cancel: CancellationToken,
}

/// Check of a single leaf resource
#[derive(Debug, Clone)]
pub struct CheckTask {
    resource: ResourceRef,
    sequence: usize,
}

impl CheckTask {
    pub fn new(resource: ResourceRef, sequence: usize) -> Self {
        Self { resource, sequence }
    }

    pub fn path(&self) -> &Path {
        self.resource.path()
    }

    /// Position of the task in submission order
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub(crate) fn run(&self, context: &TaskContext, worker: &mut Worker) -> TaskOutcome {
        let path = self.resource.path();

        if context.cancel.is_cancelled() {
            trace!("Skipping {} after cancellation", path.display());
            return TaskOutcome::Cancelled;
        }

        context
            .reporter
            .set_task_name(&context.progress.snapshot().status_text());

        let engine = match context.engines.get(&mut worker.engine) {
            Ok(Some(engine)) => engine,
            Ok(None) => {
                context.progress.increment_completed();
                return TaskOutcome::Success;
            }
            Err(error) => {
                return TaskOutcome::Failed(TaskFailure::Configuration {
                    path: path.to_path_buf(),
                    error,
                });
            }
        };

        let text = match read_text(self.resource.as_ref()) {
            Ok(text) => text,
            Err(e) => {
                debug!("Worker {} could not read {}: {}", worker.id, path.display(), e);
                return TaskOutcome::Failed(TaskFailure::Read(Arc::new(e)));
            }
        };

        let mut handler = MarkerHandler::new(context.sink.as_ref(), path, &text);
        if let Err(fault) = engine.check(&text, &mut handler) {
            return TaskOutcome::Failed(TaskFailure::Engine(Arc::new(EngineError {
                path: path.to_path_buf(),
                source: fault,
            })));
        }

        trace!(
            "Worker {} checked {} ({} diagnostics)",
            worker.id,
            path.display(),
            handler.recorded()
        );
        context.progress.increment_completed();
        TaskOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::engine::{
        Engine, EngineFactory, EngineFault, EngineSettings, ProblemHandler, RuleEngineFactory,
    };
    use crate::parallel::NoProgress;
    use crate::resource::{MemoryResource, Text};
    use std::collections::BTreeMap;
    use std::io::Read;

    fn context(
        factory: Arc<dyn EngineFactory>,
        settings: EngineSettings,
        eligible: bool,
    ) -> (TaskContext, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let context = TaskContext {
            engines: EngineCache::new(factory, settings, eligible),
            sink: sink.clone(),
            progress: ProgressCounter::new(),
            reporter: Arc::new(NoProgress),
            cancel: CancellationToken::new(),
        };
        (context, sink)
    }

    fn task(path: &str, content: &[u8]) -> CheckTask {
        CheckTask::new(Arc::new(MemoryResource::file(path, content.to_vec())), 0)
    }

    #[test]
    fn test_check_records_diagnostics() {
        let (context, sink) = context(Arc::new(RuleEngineFactory), EngineSettings::default(), true);
        let mut worker = Worker::new(0);

        let outcome = task("/p/c.js", b"var a;\ndebugger;\n").run(&context, &mut worker);
        assert!(matches!(outcome, TaskOutcome::Success));
        assert_eq!(context.progress.completed(), 1);

        let diagnostics = sink.diagnostics(Path::new("/p/c.js"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_cancelled_task_does_nothing() {
        let (context, sink) = context(Arc::new(RuleEngineFactory), EngineSettings::default(), true);
        context.cancel.cancel();
        let mut worker = Worker::new(0);

        let outcome = task("/p/c.js", b"debugger;\n").run(&context, &mut worker);
        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert!(!worker.engine.is_initialized());
        assert_eq!(context.engines.constructions(), 0);
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_ineligible_project_skips_corrupt_file() {
        let (context, _sink) = context(Arc::new(RuleEngineFactory), EngineSettings::default(), false);
        let mut worker = Worker::new(0);

        let outcome = task("/p/b.js", &[0x61, 0xFF, 0xFE]).run(&context, &mut worker);
        assert!(matches!(outcome, TaskOutcome::Success));
        assert_eq!(context.engines.constructions(), 0);
    }

    #[test]
    fn test_read_failure() {
        let (context, _sink) = context(Arc::new(RuleEngineFactory), EngineSettings::default(), true);
        let mut worker = Worker::new(0);

        let outcome = task("/p/b.js", &[0x61, 0xFF, 0xFE]).run(&context, &mut worker);
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::Read);
        assert_eq!(failure.path(), Path::new("/p/b.js"));
        assert_eq!(context.progress.completed(), 0);
    }

    #[test]
    fn test_configuration_failure_repeats_for_every_task() {
        let settings = EngineSettings {
            custom_lib: None,
            options: BTreeMap::from([("maxlen".to_string(), "wide".to_string())]),
        };
        let (context, _sink) = context(Arc::new(RuleEngineFactory), settings, true);
        let mut worker = Worker::new(0);

        let first = task("/p/a.js", b"").run(&context, &mut worker);
        let second = task("/p/b.js", b"").run(&context, &mut worker);

        match (first, second) {
            (
                TaskOutcome::Failed(TaskFailure::Configuration { error: a, path: pa }),
                TaskOutcome::Failed(TaskFailure::Configuration { error: b, path: pb }),
            ) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert_eq!(pa, Path::new("/p/a.js"));
                assert_eq!(pb, Path::new("/p/b.js"));
            }
            other => panic!("expected configuration failures, got {other:?}"),
        }
        assert_eq!(context.engines.constructions(), 1);
    }

    struct FaultyEngine;

    impl Engine for FaultyEngine {
        fn check(&mut self, _: &Text, _: &mut dyn ProblemHandler) -> Result<(), EngineFault> {
            Err(EngineFault::Internal("parser state corrupted".to_string()))
        }
    }

    struct FaultyFactory;

    impl EngineFactory for FaultyFactory {
        fn create(
            &self,
            _library: Option<&mut dyn Read>,
            _options: &BTreeMap<String, String>,
        ) -> Result<Box<dyn Engine>, ConfigurationError> {
            Ok(Box::new(FaultyEngine))
        }
    }

    #[test]
    fn test_engine_failure() {
        let (context, _sink) = context(Arc::new(FaultyFactory), EngineSettings::default(), true);
        let mut worker = Worker::new(0);

        let outcome = task("/p/a.js", b"var a;\n").run(&context, &mut worker);
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::Engine);
        assert_eq!(failure.to_string(), "failed checking file /p/a.js");

        match failure.clone().into_build_error() {
            BuildError::Runtime { cause: Some(cause), .. } => {
                assert_eq!(cause.source, EngineFault::Internal("parser state corrupted".to_string()));
            }
            other => panic!("expected runtime error, got {other:?}"),
        }
    }
}
