//! Shared request context and the bridge from async handlers to the
//! synchronous stores.

use std::sync::Arc;
use std::time::Duration;

use dropvault::{Storage, UserStore};

use crate::http_utils::ApiError;

/// State shared by all request handlers.
pub struct AppContext {
    pub storage: Storage,
    pub users: Arc<UserStore>,
    /// Deadline for one store operation, measured at the HTTP boundary.
    pub request_timeout: Duration,
}

impl AppContext {
    /// Run a store operation on the blocking pool, bounded by the request
    /// deadline.
    ///
    /// A timed-out operation is not cancelled; it completes in the
    /// background and its result is dropped.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> dropvault::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(op);
        match tokio::time::timeout(self.request_timeout, task).await {
            Err(_) => Err(ApiError::Timeout),
            Ok(joined) => Self::joined_result(joined),
        }
    }

    /// Run a store operation whose effect consumes data, such as a mailbox
    /// withdrawal.
    ///
    /// The request deadline does not apply: once the operation has started
    /// it may already have deleted what it returns, so its result is always
    /// awaited and handed back.
    pub async fn run_consuming<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> dropvault::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut task = tokio::task::spawn_blocking(op);
        let joined = match tokio::time::timeout(self.request_timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(
                    "Consuming operation passed the {:?} deadline, awaiting its result",
                    self.request_timeout
                );
                task.await
            }
        };
        Self::joined_result(joined)
    }

    fn joined_result<T>(
        joined: Result<dropvault::Result<T>, tokio::task::JoinError>,
    ) -> Result<T, ApiError> {
        match joined {
            Err(join_error) => Err(ApiError::Internal(join_error.to_string())),
            Ok(result) => result.map_err(ApiError::from),
        }
    }
}
