use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::warn;
use tokio::time::{timeout, Duration};

use crate::error::{GraphError, Result};

/// Shared flag polled by long analyses between their commit points.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of a task run under a deadline.
#[derive(Debug)]
pub enum Timed<T> {
    Completed(T, Duration),
    TimedOut(Duration),
}

impl<T> Timed<T> {
    pub fn elapsed(&self) -> Duration {
        match self {
            Timed::Completed(_, elapsed) => *elapsed,
            Timed::TimedOut(elapsed) => *elapsed,
        }
    }
}

/// Run a blocking analysis on a worker thread with a deadline.
///
/// On expiry the task's token is tripped and the worker is awaited until it
/// reaches its next checkpoint; nothing is killed, so the graph is left at
/// its last commit point.
pub async fn run_with_timeout<F, T>(func: F, timeout_sec: u64) -> Result<Timed<T>>
where
    F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let timeout_duration = Duration::from_secs(timeout_sec);
    let token = CancelToken::new();
    let worker_token = token.clone();
    let start = Instant::now();

    // Channel to receive the result.
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    let handle = thread::spawn(move || {
        let _ = tx.send(func(worker_token));
    });

    let result = match timeout(timeout_duration, &mut rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => {
            // The sender was dropped without a value, so the worker panicked.
            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
            return Err(GraphError::Cancelled);
        }
        Err(_) => {
            warn!("Deadline of {}s reached, cancelling the running analysis", timeout_sec);
            token.cancel();
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(GraphError::Cancelled),
            }
        }
    };

    match result {
        Ok(value) => Ok(Timed::Completed(value, start.elapsed())),
        Err(GraphError::Cancelled) => Ok(Timed::TimedOut(start.elapsed())),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_checkpoint() {
        let token = CancelToken::new();
        assert!(token.checkpoint().is_ok());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.checkpoint(), Err(GraphError::Cancelled));
    }

    #[tokio::test]
    async fn test_task_completes_before_timeout() {
        let result = run_with_timeout(|_| {
            thread::sleep(Duration::from_millis(100));
            Ok(7u32)
        }, 2).await.unwrap();

        match result {
            Timed::Completed(value, elapsed) => {
                assert_eq!(value, 7);
                assert!(elapsed < Duration::from_secs(2));
            }
            Timed::TimedOut(_) => panic!("task should have finished"),
        }
    }

    #[tokio::test]
    async fn test_task_times_out_at_checkpoint() {
        let start = Instant::now();

        // A task that only stops when its token is tripped.
        let result = run_with_timeout(|token: CancelToken| -> Result<()> {
            loop {
                token.checkpoint()?;
                thread::sleep(Duration::from_millis(20));
            }
        }, 1).await.unwrap();

        assert!(matches!(result, Timed::TimedOut(_)));
        assert!(result.elapsed() >= Duration::from_secs(1));
        // The worker stops quickly after the deadline.
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_task_error_is_propagated() {
        let result = run_with_timeout(|_| -> Result<()> {
            Err(GraphError::UnknownVertex(3))
        }, 1).await;
        assert_eq!(result.unwrap_err(), GraphError::UnknownVertex(3));
    }
}
