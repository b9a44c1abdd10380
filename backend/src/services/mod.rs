//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and the auth primitives.

pub mod auth;
pub mod task;

pub use auth::{spawn_refresh_token_sweeper, AuthService, AuthSettings};
pub use task::{TaskError, TaskService};

use crate::repositories::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run a store call under a deadline. An elapsed deadline is
/// [`StoreError::Timeout`].
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout = ?timeout, "Store call timed out");
            Err(StoreError::Timeout)
        }
    }
}
