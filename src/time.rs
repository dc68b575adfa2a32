//! Sleep abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait that lets the retry driver wait
//! between attempts without being tied to a specific timer. Production code
//! uses [`TokioSleeper`]; tests use [`InstantSleeper`] or their own recorder.

use std::future::Future;
use std::time::Duration;

/// Abstraction over "wait for a duration".
///
/// # Example
///
/// ```
/// use meteo_cooloff::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// InstantSleeper.sleep(Duration::from_secs(60)).await; // returns immediately
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Suspends the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
///
/// Only the calling task is suspended; other tasks keep running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately, ignoring the requested duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
