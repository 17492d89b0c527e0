//! Virtual clock — deterministic time for testing polling loops.

use std::sync::Mutex;

use tokio::sync::oneshot;

use txq_types::Timestamp;
use txq_utils::Clock;

struct Waiter {
    trigger: Timestamp,
    tx: oneshot::Sender<()>,
}

struct Inner {
    now: Timestamp,
    waiters: Vec<Waiter>,
    auto_advance: bool,
}

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Pending `wait` calls are queued
/// by trigger time; [`advance`](VirtualClock::advance) resolves every
/// waiter due at or before the target, earliest first, firing same-instant
/// waiters as one batch and yielding to the runtime between batches so
/// continuations of a resolved batch run before the next batch fires.
pub struct VirtualClock {
    inner: Mutex<Inner>,
}

impl VirtualClock {
    /// A trillion milliseconds after the Unix epoch, which is mid-2001.
    pub const START_TIME: Timestamp = Timestamp::new(1_000_000_000_000);

    pub fn new() -> Self {
        Self::starting_at(Self::START_TIME)
    }

    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            inner: Mutex::new(Inner {
                now,
                waiters: Vec::new(),
                auto_advance: false,
            }),
        }
    }

    /// When enabled, each `wait` advances the clock to its own trigger
    /// time instead of blocking until an explicit `advance`.
    pub fn set_auto_advance(&self, enabled: bool) {
        self.inner.lock().unwrap().auto_advance = enabled;
    }

    /// Move the clock forward by `millis`, resolving due waiters in
    /// trigger-time order along the way.
    pub async fn advance(&self, millis: u64) {
        let target = self.inner.lock().unwrap().now.add_millis(millis);
        self.advance_to(target).await;
    }

    async fn advance_to(&self, target: Timestamp) {
        loop {
            let batch = {
                let mut inner = self.inner.lock().unwrap();
                inner.waiters.sort_by_key(|w| w.trigger);
                match inner.waiters.first() {
                    Some(w) if w.trigger <= target => {
                        let trigger = w.trigger;
                        inner.now = trigger;
                        let mut batch = Vec::new();
                        while inner.waiters.first().map_or(false, |w| w.trigger == trigger) {
                            batch.push(inner.waiters.remove(0));
                        }
                        batch
                    }
                    _ => break,
                }
            };
            for waiter in batch {
                let _ = waiter.tx.send(());
            }
            // Let the continuations of this batch run before the next
            // batch fires.
            tokio::task::yield_now().await;
        }
        self.inner.lock().unwrap().now = target;
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        self.inner.lock().unwrap().now
    }

    async fn wait(&self, millis: u64) {
        if millis == 0 {
            return;
        }
        let (tx, rx) = oneshot::channel();
        let (trigger, auto) = {
            let mut inner = self.inner.lock().unwrap();
            let trigger = inner.now.add_millis(millis);
            inner.waiters.push(Waiter { trigger, tx });
            (trigger, inner.auto_advance)
        };
        if auto {
            self.advance_to(trigger).await;
        }
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn starts_at_the_fixed_epoch() {
        let clock = VirtualClock::new();
        assert_eq!(clock.now(), VirtualClock::START_TIME);
    }

    #[tokio::test]
    async fn advance_moves_time_with_no_waiters() {
        let clock = VirtualClock::new();
        clock.advance(250).await;
        assert_eq!(clock.now(), VirtualClock::START_TIME.add_millis(250));
    }

    #[tokio::test]
    async fn zero_length_wait_completes_immediately() {
        let clock = VirtualClock::new();
        clock.wait(0).await;
        assert_eq!(clock.now(), VirtualClock::START_TIME);
    }

    #[tokio::test]
    async fn wait_resolves_only_once_advanced_past_trigger() {
        let clock = Arc::new(VirtualClock::new());
        let done = Arc::new(AtomicBool::new(false));

        let task = {
            let clock = Arc::clone(&clock);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                clock.wait(100).await;
                done.store(true, Ordering::SeqCst);
            })
        };
        // Let the task register its waiter.
        tokio::task::yield_now().await;

        clock.advance(50).await;
        assert!(!done.load(Ordering::SeqCst));

        clock.advance(60).await;
        assert!(done.load(Ordering::SeqCst));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn waiters_resolve_in_trigger_time_order() {
        let clock = Arc::new(VirtualClock::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for millis in [300u64, 100, 200] {
            let clock = Arc::clone(&clock);
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                clock.wait(millis).await;
                order.lock().unwrap().push(millis);
            }));
        }
        tokio::task::yield_now().await;

        clock.advance(1000).await;
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![100, 200, 300]);
        assert_eq!(clock.now(), VirtualClock::START_TIME.add_millis(1000));
    }

    #[tokio::test]
    async fn same_instant_waiters_fire_as_one_batch() {
        let clock = Arc::new(VirtualClock::new());
        let hits = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for tag in ["a", "b"] {
            let clock = Arc::clone(&clock);
            let hits = Arc::clone(&hits);
            tasks.push(tokio::spawn(async move {
                clock.wait(100).await;
                // Both observe the batch's trigger time, not one after
                // the other.
                hits.lock().unwrap().push((tag, clock.now()));
            }));
        }
        tokio::task::yield_now().await;

        clock.advance(100).await;
        for task in tasks {
            task.await.unwrap();
        }

        let hits = hits.lock().unwrap();
        let expected = VirtualClock::START_TIME.add_millis(100);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(_, at)| *at == expected));
    }

    #[tokio::test]
    async fn chained_waits_resolve_across_batches() {
        let clock = Arc::new(VirtualClock::new());
        let done = Arc::new(AtomicBool::new(false));

        let task = {
            let clock = Arc::clone(&clock);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                clock.wait(100).await;
                clock.wait(100).await;
                done.store(true, Ordering::SeqCst);
            })
        };
        tokio::task::yield_now().await;

        // One advance covers both waits: the second is registered during
        // the yield after the first batch resolves.
        clock.advance(200).await;
        assert!(done.load(Ordering::SeqCst));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn auto_advance_resolves_waits_unattended() {
        let clock = VirtualClock::new();
        clock.set_auto_advance(true);

        clock.wait(500).await;
        assert_eq!(clock.now(), VirtualClock::START_TIME.add_millis(500));
    }
}
