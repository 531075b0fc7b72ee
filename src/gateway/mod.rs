//! Asynchronous execution with a deadline.
//!
//! [`AsyncGateway::submit`] spawns the operation on a worker task and hands
//! back a [`DeferredResult`] immediately. A supervisor task races the worker
//! against the deadline and resolves the handle exactly once:
//!
//! - worker returns `Ok(v)` → [`Resolution::Completed`]
//! - worker returns `Err(e)` or panics → [`Resolution::Failed`]
//! - deadline elapses first → [`Resolution::TimedOut`] carrying the timeout
//!
//! A timed-out worker is detached, not aborted. It may run to completion,
//! but its output is dropped and never reaches the handle.

mod deferred;

pub use deferred::{DeferredResult, Resolution};

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::telemetry;
use crate::{HuginnError, Result};

/// Default deadline for submitted operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Spawns operations with a bounded wait.
#[derive(Debug, Clone)]
pub struct AsyncGateway {
    timeout: Duration,
    runtime: Option<Handle>,
}

impl Default for AsyncGateway {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl AsyncGateway {
    /// Gateway that spawns on the caller's runtime.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            runtime: None,
        }
    }

    /// Gateway that spawns on a dedicated runtime (a secondary task pool).
    pub fn with_runtime(timeout: Duration, runtime: Handle) -> Self {
        Self {
            timeout,
            runtime: Some(runtime),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Schedule `operation` and return its handle without waiting.
    ///
    /// Outside a tokio runtime, and without a configured one, the handle
    /// resolves immediately as `Failed` with a configuration error.
    pub fn submit<T, Fut>(&self, operation: Fut) -> DeferredResult<T>
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let runtime = match self.runtime.clone().map_or_else(Handle::try_current, Ok) {
            Ok(handle) => handle,
            Err(e) => {
                return DeferredResult::resolved(Resolution::Failed(HuginnError::Configuration(
                    format!("no tokio runtime available: {e}"),
                )));
            }
        };

        let deferred = DeferredResult::pending();
        let slot = deferred.clone();
        let timeout = self.timeout;
        let deadline = Instant::now() + timeout;
        let worker = runtime.spawn(operation);

        runtime.spawn(async move {
            let resolution = match tokio::time::timeout_at(deadline, worker).await {
                Ok(Ok(Ok(value))) => Resolution::Completed(value),
                Ok(Ok(Err(e))) => {
                    debug!(error = %e, "async operation failed");
                    Resolution::Failed(e)
                }
                Ok(Err(join_err)) => {
                    warn!(error = %join_err, "async worker did not complete");
                    Resolution::Failed(HuginnError::TaskFailed(join_err.to_string()))
                }
                Err(_) => {
                    metrics::counter!(telemetry::ASYNC_TIMEOUTS_TOTAL).increment(1);
                    warn!(timeout_ms = timeout.as_millis() as u64, "async operation timed out");
                    Resolution::TimedOut(timeout)
                }
            };
            slot.resolve(resolution);
        });

        deferred
    }
}
