use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use tracing::{debug, error, trace};

use crate::error::OrchestrationError;

/// Index of a worker thread, starting at 0
pub type WorkerId = usize;

type Job<S, R> = Box<dyn FnOnce(&mut S) -> R + Send>;

/// A queued job together with the channel its completion goes back on
struct Envelope<S, R> {
    sequence: usize,
    job: Job<S, R>,
    outcome: Sender<Completion<R>>,
}

/// How a submitted job ended
#[derive(Debug)]
pub enum Completion<R> {
    Finished(R),
    /// The job panicked; carries the panic message
    Panicked(String),
    /// The job never reported back (the pool was interrupted or timed out)
    Lost,
}

/// Receipt for a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    sequence: usize,
}

impl TaskHandle {
    /// Position of the job in submission order
    pub fn sequence(&self) -> usize {
        self.sequence
    }
}

/// Result of draining a pool
#[derive(Debug)]
pub struct Drained<R> {
    /// One completion per submitted job, in submission order
    pub completions: Vec<Completion<R>>,
    /// Set when the pool could not account for every job
    pub interruption: Option<OrchestrationError>,
}

/// Fixed-size pool of named worker threads.
///
/// Every worker owns a state value `S`, created by `init` on the worker's own
/// thread before it takes its first job, and handed to each job it runs.
/// State never moves between threads, so it need not be `Send`.
pub struct TaskPool<S, R> {
    sender: Option<Sender<Envelope<S, R>>>,
    workers: Vec<JoinHandle<()>>,
    pending: Vec<Receiver<Completion<R>>>,
}

impl<S, R> TaskPool<S, R>
where
    S: 'static,
    R: Send + 'static,
{
    /// Spawn `workers` threads (at least one)
    pub fn new<F>(workers: usize, init: F) -> Result<Self, OrchestrationError>
    where
        F: Fn(WorkerId) -> S + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let (sender, receiver) = unbounded::<Envelope<S, R>>();
        let init = std::sync::Arc::new(init);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let receiver = receiver.clone();
            let init = init.clone();
            let spawned = thread::Builder::new()
                .name(format!("lintpass-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, receiver, init.as_ref()));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Closing the queue lets the already spawned workers exit
                    drop(sender);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(OrchestrationError::Spawn(e));
                }
            }
        }

        debug!("Started task pool with {} workers", workers);

        Ok(Self {
            sender: Some(sender),
            workers: handles,
            pending: Vec::new(),
        })
    }

    /// Queue a job; it runs on whichever worker is free first
    pub fn submit<J>(&mut self, job: J) -> Result<TaskHandle, OrchestrationError>
    where
        J: FnOnce(&mut S) -> R + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| OrchestrationError::Interrupted("task pool is closed".to_string()))?;

        let sequence = self.pending.len();
        let (outcome, receiver) = bounded(1);
        sender
            .send(Envelope {
                sequence,
                job: Box::new(job),
                outcome,
            })
            .map_err(|_| {
                OrchestrationError::Interrupted("all worker threads have exited".to_string())
            })?;

        self.pending.push(receiver);
        Ok(TaskHandle { sequence })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of jobs accepted so far
    pub fn submitted(&self) -> usize {
        self.pending.len()
    }

    /// Stop accepting jobs and wait for every submitted job to finish.
    ///
    /// Waiting is bounded by `timeout` overall. Jobs that have not reported
    /// back by then are returned as [`Completion::Lost`] and the worker
    /// threads are left to finish on their own.
    pub fn drain(mut self, timeout: Duration) -> Drained<R> {
        drop(self.sender.take());

        let deadline = Instant::now() + timeout;
        let pending = std::mem::take(&mut self.pending);
        let mut completions = Vec::with_capacity(pending.len());
        let mut interruption = None;
        let mut timed_out = false;

        for (sequence, receiver) in pending.into_iter().enumerate() {
            if timed_out {
                completions.push(Completion::Lost);
                continue;
            }

            match receiver.recv_deadline(deadline) {
                Ok(completion) => completions.push(completion),
                Err(RecvTimeoutError::Timeout) => {
                    error!("Task pool did not drain within {:?}", timeout);
                    timed_out = true;
                    interruption.get_or_insert(OrchestrationError::DrainTimeout(timeout));
                    completions.push(Completion::Lost);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!("Task {} was dropped before it completed", sequence);
                    interruption.get_or_insert_with(|| {
                        OrchestrationError::Interrupted(format!(
                            "task {sequence} was dropped before it completed"
                        ))
                    });
                    completions.push(Completion::Lost);
                }
            }
        }

        if !timed_out {
            for handle in self.workers.drain(..) {
                let _ = handle.join();
            }
        }

        Drained {
            completions,
            interruption,
        }
    }
}

fn worker_loop<S, R, F>(worker_id: WorkerId, receiver: Receiver<Envelope<S, R>>, init: &F)
where
    F: Fn(WorkerId) -> S,
{
    let mut state = match panic::catch_unwind(AssertUnwindSafe(|| init(worker_id))) {
        Ok(state) => state,
        Err(payload) => {
            error!(
                "Worker {} failed to initialize: {}",
                worker_id,
                panic_message(payload.as_ref())
            );
            return;
        }
    };

    while let Ok(Envelope {
        sequence,
        job,
        outcome,
    }) = receiver.recv()
    {
        trace!("Worker {} running task {}", worker_id, sequence);

        let completion = match panic::catch_unwind(AssertUnwindSafe(|| job(&mut state))) {
            Ok(result) => Completion::Finished(result),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Task {} panicked on worker {}: {}", sequence, worker_id, message);
                Completion::Panicked(message)
            }
        };

        // The pool may have stopped waiting after a timeout
        let _ = outcome.send(completion);
    }

    trace!("Worker {} exiting", worker_id);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn finished<R>(completions: Vec<Completion<R>>) -> Vec<R> {
        completions
            .into_iter()
            .map(|c| match c {
                Completion::Finished(value) => value,
                other => panic!("unexpected completion: {:?}", std::mem::discriminant(&other)),
            })
            .collect()
    }

    #[test]
    fn test_completions_follow_submission_order() {
        let mut pool = TaskPool::new(4, |_| ()).unwrap();
        for n in 0..20u64 {
            let handle = pool
                .submit(move |_: &mut ()| {
                    // Later jobs finish first
                    thread::sleep(Duration::from_millis(20 - n));
                    n
                })
                .unwrap();
            assert_eq!(handle.sequence(), n as usize);
        }
        assert_eq!(pool.submitted(), 20);

        let drained = pool.drain(Duration::from_secs(30));
        assert!(drained.interruption.is_none());
        assert_eq!(finished(drained.completions), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_job_does_not_stop_worker() {
        let mut pool = TaskPool::new(1, |_| ()).unwrap();
        pool.submit(|_: &mut ()| -> u32 { panic!("boom") }).unwrap();
        pool.submit(|_: &mut ()| 7).unwrap();

        let drained = pool.drain(Duration::from_secs(30));
        assert!(drained.interruption.is_none());
        assert!(matches!(&drained.completions[0], Completion::Panicked(m) if m == "boom"));
        assert!(matches!(drained.completions[1], Completion::Finished(7)));
    }

    #[test]
    fn test_state_is_created_on_each_worker_thread() {
        let mut pool = TaskPool::new(3, |worker_id| {
            let name = thread::current().name().map(str::to_string);
            (worker_id, name, 0usize)
        })
        .unwrap();
        assert_eq!(pool.worker_count(), 3);

        for _ in 0..30 {
            pool.submit(|state: &mut (WorkerId, Option<String>, usize)| {
                state.2 += 1;
                thread::sleep(Duration::from_millis(1));
                state.clone()
            })
            .unwrap();
        }

        let results = finished(pool.drain(Duration::from_secs(30)).completions);
        let mut last_seen: HashMap<WorkerId, usize> = HashMap::new();
        for (worker_id, name, count) in results {
            assert!(worker_id < 3);
            assert_eq!(name, Some(format!("lintpass-worker-{worker_id}")));
            let previous = last_seen.insert(worker_id, count).unwrap_or(0);
            assert!(count > previous);
        }
    }

    #[test]
    fn test_drain_timeout_reports_lost_jobs() {
        let mut pool = TaskPool::new(1, |_| ()).unwrap();
        pool.submit(|_: &mut ()| thread::sleep(Duration::from_millis(500)))
            .unwrap();
        pool.submit(|_: &mut ()| ()).unwrap();

        let drained = pool.drain(Duration::from_millis(10));
        assert!(matches!(
            drained.interruption,
            Some(OrchestrationError::DrainTimeout(_))
        ));
        assert_eq!(drained.completions.len(), 2);
        assert!(
            drained
                .completions
                .iter()
                .all(|c| matches!(c, Completion::Lost))
        );
    }

    #[test]
    fn test_drain_without_jobs() {
        let pool: TaskPool<(), ()> = TaskPool::new(0, |_| ()).unwrap();
        assert_eq!(pool.worker_count(), 1);

        let drained = pool.drain(Duration::from_secs(1));
        assert!(drained.completions.is_empty());
        assert!(drained.interruption.is_none());
    }

    #[test]
    fn test_failed_worker_init_interrupts_pool() {
        let mut pool = TaskPool::new(1, |_| -> () { panic!("no state") }).unwrap();
        // The job may be accepted before the worker exits; either way it never runs
        let submitted = pool.submit(|_: &mut ()| ()).is_ok();

        let drained = pool.drain(Duration::from_secs(30));
        if submitted {
            assert!(matches!(drained.completions[0], Completion::Lost));
            assert!(matches!(
                drained.interruption,
                Some(OrchestrationError::Interrupted(_))
            ));
        }
    }
}
