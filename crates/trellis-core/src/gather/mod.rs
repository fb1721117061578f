//! # Trellis Task Gatherer
//!
//! Runs a batch of IO or subprocess tasks and returns one result per task,
//! in input order, regardless of completion order.
//!
//! Every task is bounded by the batch timeout. A task that exceeds it is
//! dropped and reported as [`TaskError::TimedOut`]: dropping abandons the
//! work, it does not kill a subprocess the task may have started.
//!
//! Package installers must never overlap: running several at once
//! deadlocked them. Run them with [`GatherMode::Sequential`], or one by one
//! through [`bounded`] when each needs its own timeout.
use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

/// How tasks of a batch are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherMode {
    /// Up to `max_parallel` tasks at once
    Concurrent,
    /// One task at a time, in input order
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherOptions {
    /// Applied to each task individually
    pub timeout: Duration,
    /// `None` runs the whole batch at once
    pub max_parallel: Option<usize>,
    pub mode: GatherMode,
}

impl GatherOptions {
    pub fn concurrent(timeout: Duration, max_parallel: Option<usize>) -> Self {
        Self {
            timeout,
            max_parallel,
            mode: GatherMode::Concurrent,
        }
    }

    pub fn sequential(timeout: Duration) -> Self {
        Self {
            timeout,
            max_parallel: Some(1),
            mode: GatherMode::Sequential,
        }
    }

    fn limit(&self, batch_size: usize) -> usize {
        match self.mode {
            GatherMode::Sequential => 1,
            GatherMode::Concurrent => self.max_parallel.unwrap_or(batch_size).max(1),
        }
    }
}

/// Failure of a single gathered task
#[derive(Debug, Error)]
pub enum TaskError<E> {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Failed(E),
}

impl<E> TaskError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::TimedOut(_))
    }
}

/// Run `tasks` according to `options`, preserving input order.
pub async fn gather<T, E, F>(tasks: Vec<F>, options: &GatherOptions) -> Vec<Result<T, TaskError<E>>>
where
    F: Future<Output = Result<T, E>>,
{
    let limit = options.limit(tasks.len());
    let timeout = options.timeout;
    log::trace!("Gathering {} tasks ({:?}, limit {})", tasks.len(), options.mode, limit);

    stream::iter(tasks.into_iter().map(|task| bounded(task, timeout)))
        .buffered(limit)
        .collect()
        .await
}

/// Run a single task with its own `timeout`.
pub async fn bounded<T, E, F>(task: F, timeout: Duration) -> Result<T, TaskError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TaskError::Failed(e)),
        Err(_) => Err(TaskError::TimedOut(timeout)),
    }
}

/// Gathered results split into successes and failures, each tagged with the
/// index of the task that produced it.
#[derive(Debug)]
pub struct GatherReport<T, E> {
    pub successes: Vec<(usize, T)>,
    pub failures: Vec<(usize, TaskError<E>)>,
}

impl<T, E> GatherReport<T, E> {
    pub fn partition(results: Vec<Result<T, TaskError<E>>>) -> Self {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) => successes.push((index, value)),
                Err(e) => failures.push((index, e)),
            }
        }
        Self { successes, failures }
    }

    pub fn failure_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|(i, _)| *i).collect()
    }

    pub fn success_indices(&self) -> Vec<usize> {
        self.successes.iter().map(|(i, _)| *i).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests;
