//! Diagnostics recorded against resources
//!
//! The sink owns the diagnostic set of every resource. A build pass clears a
//! file's diagnostics before checking it again, then repopulates them through
//! a [`MarkerHandler`] while the engine runs.

mod marker;

pub use marker::MarkerHandler;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::engine::Severity;

/// A persisted problem report for one location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    pub rule: String,
}

/// Storage for diagnostics.
///
/// Implementations must accept concurrent writes for different resources.
/// Writes for one resource always come from a single thread at a time.
pub trait DiagnosticSink: Send + Sync {
    /// Remove all diagnostics of `resource`; a no-op when there are none
    fn clear(&self, resource: &Path);

    fn add(&self, resource: &Path, diagnostic: Diagnostic);
}

/// Thread-safe in-memory diagnostic store
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<BTreeMap<PathBuf, Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics currently recorded for `resource`
    pub fn diagnostics(&self, resource: &Path) -> Vec<Diagnostic> {
        self.lock().get(resource).cloned().unwrap_or_default()
    }

    /// All resources with at least one diagnostic, sorted by path
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<Diagnostic>> {
        self.lock().clone()
    }

    /// Total number of diagnostics with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.lock()
            .values()
            .flatten()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Vec<Diagnostic>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for MemorySink {
    fn clear(&self, resource: &Path) {
        self.lock().remove(resource);
    }

    fn add(&self, resource: &Path, diagnostic: Diagnostic) {
        self.lock()
            .entry(resource.to_path_buf())
            .or_default()
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(line: usize, severity: Severity) -> Diagnostic {
        Diagnostic {
            line,
            column: 1,
            severity,
            message: "problem".to_string(),
            rule: "test".to_string(),
        }
    }

    #[test]
    fn test_clear_is_idempotent() {
        let sink = MemorySink::new();
        let path = Path::new("/p/a.js");

        sink.clear(path);
        assert!(sink.diagnostics(path).is_empty());

        sink.add(path, diagnostic(1, Severity::Warning));
        sink.clear(path);
        sink.clear(path);
        assert!(sink.diagnostics(path).is_empty());
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_counts_by_severity() {
        let sink = MemorySink::new();
        sink.add(Path::new("/p/a.js"), diagnostic(1, Severity::Error));
        sink.add(Path::new("/p/a.js"), diagnostic(2, Severity::Warning));
        sink.add(Path::new("/p/b.js"), diagnostic(3, Severity::Error));

        assert_eq!(sink.count(Severity::Error), 2);
        assert_eq!(sink.count(Severity::Warning), 1);
        assert_eq!(sink.count(Severity::Info), 0);
        assert_eq!(sink.snapshot().len(), 2);
    }
}
