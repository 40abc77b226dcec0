//! Worker pool and progress tracking for build passes
//!
//! This module provides the threading infrastructure a build pass runs on.
//!
//! # Architecture Responsibilities
//!
//! The parallel module focuses exclusively on **worker management** and **progress accounting**:
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Resource Calculation**: Applies user configuration (thread percentage, max threads) to available resources
//! - **Execution**: Runs submitted jobs on a fixed set of named worker threads fed by a crossbeam channel
//! - **Worker State**: Gives every worker its own state value, created on that worker's thread
//! - **Drain**: Stops accepting work and waits, with an upper bound, for every submitted job
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Does not know about files, engines or diagnostics
//! - **Failure Policy**: Does not decide which job result matters; it reports every one in submission order
//!
//! # Separation of Concerns
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Client        │    │   Parallel       │    │   System        │
//! │   (BuildPass)   │───▶│   Module         │───▶│   Resources     │
//! │                 │    │                  │    │                 │
//! │ • Traversal     │    │ • Worker threads │    │ • CPU cores     │
//! │ • Engines       │    │ • Job queue      │    │ • OS threads    │
//! │ • Failures      │    │ • Drain/timeout  │    │                 │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use lintpass::parallel::{Completion, TaskPool};
//!
//! // Each worker keeps a running total of the jobs it executed
//! let mut pool = TaskPool::new(2, |_worker_id| 0usize).unwrap();
//! for n in 1..=4 {
//!     pool.submit(move |seen: &mut usize| {
//!         *seen += 1;
//!         n * 10
//!     })
//!     .unwrap();
//! }
//!
//! let drained = pool.drain(Duration::from_secs(60));
//! assert!(drained.interruption.is_none());
//! let results: Vec<usize> = drained
//!     .completions
//!     .into_iter()
//!     .filter_map(|c| match c {
//!         Completion::Finished(value) => Some(value),
//!         Completion::Panicked(_) | Completion::Lost => None,
//!     })
//!     .collect();
//! assert_eq!(results, vec![10, 20, 30, 40]);
//! ```

pub mod pool;
pub mod progress;

pub use pool::{Completion, Drained, TaskHandle, TaskPool, WorkerId};
pub use progress::{
    NoProgress, ProgressCounter, ProgressReporter, ProgressSnapshot, SpinnerProgress,
    TracingProgress,
};

/// Calculate the worker count from available system resources and configuration limits
///
/// # Parameters
/// - `max_threads_config`: User-specified maximum threads (0 = no limit)
/// - `thread_percentage`: Percentage of CPU cores to utilize (e.g., 75 for 75%)
///
/// # Algorithm
/// ```text
/// 1. Detect available CPU cores: num_cpus::get()
/// 2. Apply percentage: cores * thread_percentage / 100
/// 3. Apply config limit: min(max_threads_config, percentage_result) if max_threads_config > 0
/// 4. Ensure minimum: max(1, final_result)
/// ```
///
/// # Examples
/// ```rust
/// use lintpass::parallel::calculate_optimal_workers;
///
/// let workers = calculate_optimal_workers(0, 100);
/// assert!(workers >= 1); // Always at least 1 worker
///
/// let workers = calculate_optimal_workers(2, 100);
/// assert!(workers <= 2); // Respects max limit
/// ```
pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
    let available_cores = num_cpus::get();

    let workers_by_percentage =
        std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    // 0 means use percentage calculation only
    if max_threads_config > 0 {
        std::cmp::min(max_threads_config, workers_by_percentage)
    } else {
        workers_by_percentage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_workers_calculation() {
        assert!(calculate_optimal_workers(0, 100) >= 1);
        assert_eq!(calculate_optimal_workers(1, 100), 1);
        // A tiny percentage still yields one worker
        assert_eq!(calculate_optimal_workers(0, 1).max(1), calculate_optimal_workers(0, 1));
    }
}
