//! Bounded poll-until-ready loop.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::Clock;
use crate::error::{ControlError, ControlResult};
use crate::transport::ApiResponse;

/// Attempt budget and fixed interval for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of fetches.
    pub max_attempts: u32,
    /// Wait between fetches.
    pub interval: Duration,
}

impl PollPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on time spent waiting: attempts × interval.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Fetch until `predicate` holds for a 200 response.
///
/// A non-200 response, or a 200 whose predicate is false, counts as one
/// unsatisfied attempt followed by a wait of `policy.interval`. No wait
/// follows the final attempt. Errors returned by `fetch` propagate
/// immediately.
pub async fn poll_until<F, Fut, P>(
    operation: &str,
    mut fetch: F,
    predicate: P,
    policy: PollPolicy,
    clock: &dyn Clock,
    cancel: &CancellationToken,
) -> ControlResult<ApiResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ControlResult<ApiResponse>>,
    P: Fn(&ApiResponse) -> bool,
{
    let started = clock.now();

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(ControlError::cancelled(operation));
        }

        let response = fetch().await?;
        if response.is_ok() && predicate(&response) {
            debug!(operation, attempt, "poll condition met");
            return Ok(response);
        }

        debug!(
            operation,
            attempt,
            max_attempts = policy.max_attempts,
            status = response.status,
            "poll condition not met"
        );

        if attempt < policy.max_attempts {
            tokio::select! {
                () = cancel.cancelled() => return Err(ControlError::cancelled(operation)),
                () = clock.sleep(policy.interval) => {}
            }
        }
    }

    Err(ControlError::TimeoutExceeded {
        operation: operation.to_owned(),
        attempts: policy.max_attempts,
        elapsed: clock.now().saturating_sub(started),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;

    fn policy() -> PollPolicy {
        PollPolicy::new(5, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn never_satisfied_times_out_after_exactly_max_attempts() {
        let clock = ManualClock::new();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = poll_until(
            "build",
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(ApiResponse::new(200, r#"{"build_status":"running"}"#)) }
            },
            |_| false,
            policy(),
            &clock,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        match result {
            Err(ControlError::TimeoutExceeded {
                attempts, elapsed, ..
            }) => {
                assert_eq!(attempts, 5);
                assert_eq!(elapsed, Duration::from_secs(4));
            }
            other => panic!("expected TimeoutExceeded, got {other:?}"),
        }
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 4]);
    }

    #[tokio::test]
    async fn non_200_counts_as_unsatisfied() {
        let clock = ManualClock::new();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let response = poll_until(
            "health",
            || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(if n < 2 {
                        ApiResponse::new(502, "bad gateway")
                    } else {
                        ApiResponse::new(200, "ready")
                    })
                }
            },
            |r| r.text == "ready",
            policy(),
            &clock,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(response.text, "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let clock = ManualClock::new();
        let result = poll_until(
            "build",
            || async {
                Err(ControlError::Transport {
                    endpoint: "containerbuild/abc/run-status".to_owned(),
                    message: "reset".to_owned(),
                })
            },
            |_| true,
            policy(),
            &clock,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(ControlError::Transport { .. })));
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_fetching() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let clock = ManualClock::new();

        let result = poll_until(
            "build",
            || async { Ok(ApiResponse::new(200, "")) },
            |_| true,
            policy(),
            &clock,
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ControlError::Cancelled { .. })));
    }

    #[test]
    fn deadline_is_attempts_times_interval() {
        let policy = PollPolicy::new(30, Duration::from_secs(60));
        assert_eq!(policy.deadline(), Duration::from_secs(30 * 60));
    }
}
