// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Backoff/Retry Executor (spec.md §4.5).
//!
//! Wraps every RPC attempt (`open`, footer fetch, stream open) in a bounded
//! exponential-backoff loop. The retry predicate is a parameter so callers
//! can select "all errors" (read-side operations) or "socket errors only"
//! (the metadata probe), per spec.md §4.5.

use std::future::Future;
use std::time::Duration;

use exponential_backoff::Backoff;

use crate::error::Error;

/// Bounded exponential-backoff policy for one retryable RPC scope.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// The schedule of wait durations between attempts; `None` means the
    /// budget is exhausted and the caller should give up.
    pub(crate) fn schedule(&self) -> Backoff {
        Backoff::new(self.max_retries, self.min_backoff, self.max_backoff)
    }
}

/// Re-run `attempt` until it succeeds, `retryable` rejects the error, or the
/// backoff budget is exhausted. `attempt` must be idempotent — per spec.md
/// §9, that holds for `open`, footer fetch, and opening a new range stream
/// (all generation-pinned), but not for pumping an already-open stream.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    retryable: impl Fn(&E) -> bool,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let backoff = policy.schedule();
    let mut schedule = (&backoff).into_iter();
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if retryable(&err) => match schedule.next() {
                Some(Some(duration)) => tokio::time::sleep(duration).await,
                _ => return Err(err),
            },
            Err(err) => return Err(err),
        }
    }
}

/// Retry predicate for stream-open attempts: all statuses are retryable
/// until the backoff budget runs out, per spec.md §4.5. Deadline
/// exhaustion (`tonic::Code::DeadlineExceeded`, synthesized by
/// [`crate::channel::ReadChannel`]'s per-RPC timeout wrapper) falls under
/// this the same as a transport error.
pub fn retry_all(_status: &tonic::Status) -> bool {
    true
}

/// Retry predicate for the metadata probe, operating on the crate's own
/// [`Error`] rather than a raw [`tonic::Status`] — the metadata
/// collaborator ([`crate::metadata::MetadataClient`]) is an external
/// surface we don't implement (spec.md §1), so it reports transient
/// socket-level failures as [`Error::TransportBroken`] /
/// [`Error::DeadlineExceeded`] rather than a status code.
pub fn error_retryable_socket_only(err: &Error) -> bool {
    matches!(err, Error::TransportBroken | Error::DeadlineExceeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy {
            max_retries: 3,
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let attempts = AtomicU32::new(0);
        let result: Result<u32, tonic::Status> = retry(&policy, retry_all, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(tonic::Status::unavailable("not yet"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let only_unavailable = |status: &tonic::Status| status.code() == tonic::Code::Unavailable;
        let result: Result<u32, tonic::Status> = retry(&policy, only_unavailable, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(tonic::Status::not_found("nope")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let policy = RetryPolicy {
            max_retries: 2,
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
        };
        let attempts = AtomicU32::new(0);
        let result: Result<u32, tonic::Status> = retry(&policy, retry_all, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(tonic::Status::unavailable("down")) }
        })
        .await;
        assert!(result.is_err());
        assert!(attempts.load(Ordering::SeqCst) >= 2);
    }
}
