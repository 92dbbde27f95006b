//! # Core Logic - Batch Executor
//!
//! Runs independent, deferred async operations with a fixed concurrency
//! ceiling. Every operation runs on the caller's task; "concurrent" means
//! interleaved awaits, never parallel threads.
//!
//! Results always come back in input order. The first failing operation (by
//! index) ends the run once its window has settled, and nothing after that
//! window is started. Operations that must not end the run have to turn
//! their own failures into values.

use crate::config::{BatchMode, ExecutorConfig};
use crate::error::BatchError;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::pin::pin;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct BatchExecutor {
    window: usize,
    mode: BatchMode,
    op_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl BatchExecutor {
    /// Creates a windowed executor. A window of 0 is treated as 1.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            mode: BatchMode::Windowed,
            op_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.concurrency)
            .with_mode(config.mode)
            .with_op_timeout(config.op_timeout())
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Puts a deadline on every operation; `None` waits forever.
    pub fn with_op_timeout(mut self, op_timeout: Option<Duration>) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Cancels this executor's token on Ctrl+C. Operations already started
    /// finish; no new ones are admitted.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("🛑 Received Ctrl+C. Finishing in-flight operations...");
                    token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });
    }

    /// Runs `ops` and returns their results in input order.
    pub async fn run<T, E, F, Fut>(&self, ops: Vec<F>) -> Result<Vec<T>, BatchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = ops.len();
        let started = Instant::now();

        let results = match self.mode {
            BatchMode::Windowed => self.run_windowed(ops).await?,
            BatchMode::Pipelined => self.run_pipelined(ops).await?,
        };

        debug!(
            "Batch of {} operations ({:?}, window {}) done in {:.1?}",
            total,
            self.mode,
            self.window,
            started.elapsed()
        );
        Ok(results)
    }

    async fn run_windowed<T, E, F, Fut>(&self, ops: Vec<F>) -> Result<Vec<T>, BatchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut results = Vec::with_capacity(ops.len());
        let mut pending = ops.into_iter().enumerate().peekable();

        while pending.peek().is_some() {
            if self.cancel.is_cancelled() {
                return Err(BatchError::Cancelled {
                    started: results.len(),
                });
            }

            let window: Vec<_> = pending
                .by_ref()
                .take(self.window)
                .map(|(index, op)| self.guarded(index, op))
                .collect();

            for outcome in join_all(window).await {
                results.push(outcome?);
            }
        }

        Ok(results)
    }

    async fn run_pipelined<T, E, F, Fut>(&self, ops: Vec<F>) -> Result<Vec<T>, BatchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slots: Vec<Option<T>> = (0..ops.len()).map(|_| None).collect();

        let mut completed = pin!(stream::iter(ops.into_iter().enumerate())
            .map(move |(index, op)| async move {
                if self.cancel.is_cancelled() {
                    return Err(BatchError::Cancelled { started: index });
                }
                self.guarded(index, op).await.map(|value| (index, value))
            })
            .buffer_unordered(self.window));

        // Returning early drops whatever is still in flight.
        while let Some(outcome) = completed.next().await {
            let (index, value) = outcome?;
            slots[index] = Some(value);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn guarded<T, E, F, Fut>(&self, index: usize, op: F) -> Result<T, BatchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let fut = op();
        let outcome = match self.op_timeout {
            Some(after) => match tokio::time::timeout(after, fut).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(BatchError::TimedOut { index, after }),
            },
            None => fut.await,
        };
        outcome.map_err(|error| BatchError::Operation { index, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_window_is_clamped() {
        let executor = BatchExecutor::new(0);
        assert_eq!(executor.window(), 1);
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = ExecutorConfig {
            concurrency: 3,
            mode: BatchMode::Pipelined,
            op_timeout_secs: Some(10),
        };
        let executor = BatchExecutor::from_config(&config);
        assert_eq!(executor.window(), 3);
        assert_eq!(executor.mode(), BatchMode::Pipelined);
        assert_eq!(executor.op_timeout, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_single_window_returns_values() {
        let executor = BatchExecutor::new(4);
        let ops: Vec<_> = (0..3u32)
            .map(|i| move || async move { Ok::<_, String>(i * 2) })
            .collect();
        assert_eq!(executor.run(ops).await.unwrap(), vec![0, 2, 4]);
    }
}
