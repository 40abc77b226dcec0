use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Started/completed task counters shared by the submitter and the workers
#[derive(Debug, Default)]
pub struct ProgressCounter {
    started: AtomicUsize,
    completed: AtomicUsize,
}

/// A consistent view of a [`ProgressCounter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub started: usize,
    pub completed: usize,
}

impl ProgressSnapshot {
    /// Progress line shown while a pass runs
    pub fn status_text(&self) -> String {
        format!("Checking file {} of {}", self.completed, self.started)
    }
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per task, before it is submitted
    pub fn increment_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    /// Called once per task that ran to completion
    pub fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        // completed first: every completion was preceded by its start
        let completed = self.completed.load(Ordering::SeqCst);
        let started = self.started.load(Ordering::SeqCst);
        ProgressSnapshot { started, completed }
    }
}

/// Receives human-readable progress from running tasks
pub trait ProgressReporter: Send + Sync {
    fn set_task_name(&self, name: &str);

    /// Called once when the pass is closed
    fn finish(&self) {}
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn set_task_name(&self, _name: &str) {}
}

/// Writes progress to the debug log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn set_task_name(&self, name: &str) {
        debug!("{}", name);
    }
}

/// Terminal spinner showing the latest progress line
#[derive(Clone)]
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A spinner that never draws
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Last message shown
    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for SpinnerProgress {
    fn set_task_name(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
