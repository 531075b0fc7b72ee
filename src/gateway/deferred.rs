//! Write-once handle for a result produced in the background.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::Notify;

use crate::{ErrorKind, HuginnError, Result};

/// Terminal state of a submitted operation.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    /// The operation returned a value before the deadline.
    Completed(T),
    /// The operation returned an error, or its worker panicked.
    Failed(HuginnError),
    /// The deadline (carried here) elapsed first. Any later result is
    /// discarded.
    TimedOut(Duration),
}

impl<T> Resolution<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Resolution::Completed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Resolution::TimedOut(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolution::Completed(v) => Some(v),
            _ => None,
        }
    }

    /// Error classification.
    ///
    /// `TimedOut` is [`ErrorKind::Timeout`]. A failed operation is
    /// [`ErrorKind::Internal`] unless it failed admission or validation,
    /// which keep their own kinds.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Resolution::Completed(_) => None,
            Resolution::Failed(e) => Some(match e.kind() {
                kind @ (ErrorKind::AdmissionRejected | ErrorKind::InvalidInput) => kind,
                _ => ErrorKind::Internal,
            }),
            Resolution::TimedOut(_) => Some(ErrorKind::Timeout),
        }
    }

    /// Convert into a plain result; `TimedOut` becomes [`HuginnError::Timeout`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Resolution::Completed(value) => Ok(value),
            Resolution::Failed(e) => Err(e),
            Resolution::TimedOut(after) => Err(HuginnError::Timeout(after)),
        }
    }
}

struct Shared<T> {
    cell: OnceLock<Resolution<T>>,
    notify: Notify,
}

/// Handle returned by [`AsyncGateway::submit`](super::AsyncGateway::submit).
///
/// Resolves exactly once. Clones observe the same resolution.
pub struct DeferredResult<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for DeferredResult<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> DeferredResult<T> {
    pub(crate) fn pending() -> Self {
        Self {
            shared: Arc::new(Shared {
                cell: OnceLock::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Handle that is already resolved.
    pub fn resolved(resolution: Resolution<T>) -> Self {
        let deferred = Self::pending();
        deferred.resolve(resolution);
        deferred
    }

    /// Set the resolution. Returns `false` if one was already set, in
    /// which case `resolution` is dropped.
    pub(crate) fn resolve(&self, resolution: Resolution<T>) -> bool {
        let first = self.shared.cell.set(resolution).is_ok();
        if first {
            self.shared.notify.notify_waiters();
        }
        first
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.cell.get().is_some()
    }

    /// The resolution, if already available.
    pub fn try_get(&self) -> Option<&Resolution<T>> {
        self.shared.cell.get()
    }

    /// Wait for the outcome as a plain result.
    pub async fn result(&self) -> Result<T>
    where
        T: Clone,
    {
        self.wait().await.clone().into_result()
    }

    /// Wait until the handle resolves.
    pub async fn wait(&self) -> &Resolution<T> {
        loop {
            // registered before the check, so a resolve in between still wakes us
            let notified = self.shared.notify.notified();
            if let Some(resolution) = self.shared.cell.get() {
                return resolution;
            }
            notified.await;
        }
    }
}

impl<T> std::fmt::Debug for DeferredResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredResult")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
