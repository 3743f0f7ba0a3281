//! Time source used by poll and retry loops.
//!
//! Production code sleeps on the tokio timer. Tests use [`ManualClock`],
//! which advances virtual time instantly and records every sleep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

/// A monotonic clock that can be slept on.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time since the clock's origin.
    fn now(&self) -> Duration;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time on the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Default)]
struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Virtual clock. `sleep` returns immediately after advancing time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    /// Create a clock at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to `sleep`, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Advance time without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.lock().elapsed += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned lock only means a test thread panicked mid-update.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().elapsed
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_advances_without_waiting() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_secs(60)).await;
        clock.sleep(Duration::from_secs(60)).await;
        clock.advance(Duration::from_secs(1));

        assert_eq!(clock.now(), Duration::from_secs(121));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(60); 2]);
    }

    #[tokio::test]
    async fn tokio_clock_measures_elapsed_time() {
        let clock = TokioClock::new();
        clock.sleep(Duration::from_millis(5)).await;
        assert!(clock.now() >= Duration::from_millis(5));
    }
}
