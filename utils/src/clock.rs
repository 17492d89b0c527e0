//! Clock capability for time-driven polling loops.
//!
//! Components that poll the staging store take a `Clock` instead of calling
//! the system time directly, so tests can substitute the virtual clock from
//! `txq-nullables` and fast-forward through polling intervals.

use std::time::Duration;
use txq_types::Timestamp;

/// Injectable time source.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;

    /// Sleep for `millis` milliseconds.
    fn wait(&self, millis: u64) -> impl std::future::Future<Output = ()> + Send;
}

/// The real clock: system time and tokio sleeps.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    async fn wait(&self, millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
