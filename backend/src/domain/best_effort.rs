//! Best-effort side effects.
//!
//! Email, push, audit and milestone side effects must never change the
//! outcome of the request that triggered them. [`BestEffort`] captures that
//! contract: failures are logged with a stable label and swallowed.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

use super::TraceId;

/// Named best-effort operation.
///
/// # Examples
/// ```
/// use itinera::domain::BestEffort;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let outcome = BestEffort::new("audit.login")
///     .run(async { Err::<(), _>("audit store offline") })
///     .await;
/// assert!(outcome.is_none());
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestEffort {
    label: &'static str,
}

impl BestEffort {
    /// Create a best-effort operation identified by `label` in logs.
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    /// Label used when logging failures.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Await `fut`, returning `Some(value)` on success and `None` after
    /// logging the failure.
    pub async fn run<T, E, Fut>(self, fut: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match fut.await {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(operation = self.label, %error, "best-effort operation failed");
                None
            }
        }
    }

    /// Detach `fut` onto the runtime, keeping the caller's trace identifier
    /// in scope for the spawned task.
    pub fn spawn<T, E, Fut>(self, fut: Fut) -> JoinHandle<Option<T>>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let work = self.run(fut);
        match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, work)),
            None => tokio::spawn(work),
        }
    }
}
