use std::future::Future;

use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("step `{step}` is no longer mounted")]
    Unmounted { step: &'static str },
    #[error("task in step `{step}` was aborted before it finished")]
    Aborted { step: &'static str },
    #[error("task in step `{step}` panicked: {message}")]
    Panicked { step: &'static str, message: String },
}

/// Owns the background work started by one funnel step.
///
/// Tearing the scope down (explicitly or by dropping it) aborts every task it
/// spawned and bumps its generation, so results produced for an earlier
/// generation can be recognised as stale and discarded.
#[derive(Debug)]
pub struct StepScope {
    step: &'static str,
    generation: u64,
    mounted: bool,
    tasks: Vec<AbortHandle>,
}

#[derive(Debug)]
pub struct ScopedTask<T> {
    handle: JoinHandle<T>,
    generation: u64,
}

impl<T> ScopedTask<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl StepScope {
    pub fn new(step: &'static str) -> Self {
        Self { step, generation: 0, mounted: true, tasks: Vec::new() }
    }

    pub fn step(&self) -> &'static str {
        self.step
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Must be called from within a tokio runtime.
    pub fn spawn<F, T>(&mut self, future: F) -> Result<ScopedTask<T>, ScopeError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if !self.mounted {
            return Err(ScopeError::Unmounted { step: self.step });
        }

        self.tasks.retain(|task| !task.is_finished());
        let handle = tokio::spawn(future);
        self.tasks.push(handle.abort_handle());
        Ok(ScopedTask { handle, generation: self.generation })
    }

    pub async fn join<T>(&self, task: ScopedTask<T>) -> Result<T, ScopeError> {
        match task.handle.await {
            Ok(value) => Ok(value),
            Err(error) if error.is_cancelled() => Err(ScopeError::Aborted { step: self.step }),
            Err(error) => Err(ScopeError::Panicked { step: self.step, message: error.to_string() }),
        }
    }

    /// Aborts outstanding tasks but keeps the step mounted. Returns how many
    /// tasks were still running.
    pub fn cancel_pending(&mut self) -> usize {
        let pending = self.pending();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.generation += 1;
        pending
    }

    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        let aborted = self.cancel_pending();
        self.mounted = false;
        debug!(
            event_name = "funnel.step.torn_down",
            step = self.step,
            aborted_tasks = aborted,
            "step scope torn down"
        );
    }
}

impl Drop for StepScope {
    fn drop(&mut self) {
        self.teardown();
    }
}
