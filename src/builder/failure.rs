//! Choosing the one failure a build pass reports
//!
//! Priority, across all outcomes of a drained pass:
//!
//! 1. configuration failures
//! 2. read failures
//! 3. engine failures and panics, reported as a runtime failure
//! 4. interruption of the pool itself
//!
//! Within a tier the first failure in submission order wins. Everything else
//! is logged and dropped.

use tracing::{debug, warn};

use super::task::{FailureKind, TaskFailure, TaskOutcome};
use crate::error::{BuildError, OrchestrationError};

fn tier(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::Configuration => 0,
        FailureKind::Read => 1,
        FailureKind::Engine | FailureKind::Unexpected => 2,
    }
}

/// Classify the outcomes of a drained pass into a single result
pub fn reconcile(
    outcomes: &[TaskOutcome],
    interruption: Option<OrchestrationError>,
) -> Result<(), BuildError> {
    let failures: Vec<&TaskFailure> = outcomes.iter().filter_map(TaskOutcome::failure).collect();

    // min_by_key keeps the first of equal keys
    let Some(selected) = failures.iter().copied().min_by_key(|f| tier(f.kind())) else {
        return match interruption {
            Some(err) => Err(BuildError::Orchestration(err)),
            None => Ok(()),
        };
    };

    let dropped = failures.len() - 1;
    if dropped > 0 {
        warn!(
            "{} more check failures not reported, showing: {}",
            dropped, selected
        );
        for failure in failures.iter().filter(|f| !std::ptr::eq(**f, selected)) {
            debug!("Dropped check failure: {}", failure);
        }
    }
    if let Some(err) = &interruption {
        debug!("Dropped pool interruption: {}", err);
    }

    Err(selected.clone().into_build_error())
}
