//! Background work — CPU-bound jobs run off the request tasks.
//!
//! [`run_with_deadline`] moves a blocking closure onto Tokio's blocking pool
//! and races it against a wall-clock timer. The calling task suspends only
//! until one of the two finishes. When the timer wins the job is detached,
//! not cancelled: it runs to completion on its worker thread and whatever
//! side effects it has (such as filling a cache) still happen.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

/// Why a background job produced no value for its caller.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job did not finish within {budget:?}")]
    DeadlineExceeded { budget: Duration },

    #[error("job panicked or was cancelled: {0}")]
    Failed(#[from] JoinError),
}

/// Runs `job` on the blocking pool and waits at most `budget` for it.
///
/// # Errors
///
/// - [`JobError::DeadlineExceeded`] — the budget elapsed first; the job keeps
///   running in the background.
/// - [`JobError::Failed`] — the job panicked.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fibserve::background::run_with_deadline;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let sum = run_with_deadline(Duration::from_secs(1), || (1..=10u32).sum::<u32>())
///     .await
///     .unwrap();
/// assert_eq!(sum, 55);
/// # }
/// ```
pub async fn run_with_deadline<F, T>(budget: Duration, job: F) -> Result<T, JobError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(budget, handle).await {
        Ok(joined) => Ok(joined?),
        Err(_elapsed) => Err(JobError::DeadlineExceeded { budget }),
    }
}
