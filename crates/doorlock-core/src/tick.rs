//! Elapsed-seconds counter and tick subscription.
//!
//! Each node keeps one process-wide counter of seconds since the last reset.
//! A periodic tick source increments it once per second through a
//! registered observer; the node's main flow reads it and resets it to zero
//! when a timed phase starts. Those are the only two writers.
//!
//! # Races
//!
//! The counter is a single atomic. A reset that lands while a tick is being
//! delivered either happens before the increment (the counter reads 1) or
//! after it (the counter reads 0). Both are valid orderings of "reset, then
//! one second passed".

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use tokio::sync::Notify;

/// Observer invoked once per elapsed second.
pub type TickObserver = Box<dyn Fn() + Send + Sync + 'static>;

/// A periodic source of one-second ticks.
///
/// The core never touches timer hardware; it only reacts to delivered ticks.
pub trait TickSource: Send + 'static {
    /// Register the single observer. Registering again replaces it.
    fn subscribe(&mut self, observer: TickObserver);
}

/// Shared elapsed-seconds counter.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone, Default)]
pub struct ElapsedSeconds {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    seconds: AtomicU32,
    notify: Notify,
}

impl ElapsedSeconds {
    /// Counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the last reset.
    pub fn seconds(&self) -> u32 {
        self.inner.seconds.load(Ordering::Acquire)
    }

    /// Advance by one second and wake the consumer. Returns the new value.
    pub fn tick(&self) -> u32 {
        let now = self.inner.seconds.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        self.inner.notify.notify_one();
        now
    }

    /// Restart counting from zero.
    pub fn reset(&self) {
        self.inner.seconds.store(0, Ordering::Release);
    }

    /// Observer that ticks this counter, for [`TickSource::subscribe`].
    pub fn observer(&self) -> TickObserver {
        let counter = self.clone();
        Box::new(move || {
            counter.tick();
        })
    }

    /// Wait until at least one tick happened since the previous call.
    ///
    /// Ticks that arrive while nobody is waiting are not lost: the next call
    /// returns immediately. Several such ticks collapse into one wakeup, so
    /// consumers must read [`Self::seconds`] rather than count wakeups.
    /// Intended for a single consumer (the node runtime).
    pub async fn changed(&self) {
        self.inner.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn tick_and_reset() {
        let elapsed = ElapsedSeconds::new();
        assert_eq!(elapsed.seconds(), 0);

        assert_eq!(elapsed.tick(), 1);
        assert_eq!(elapsed.tick(), 2);
        assert_eq!(elapsed.seconds(), 2);

        elapsed.reset();
        assert_eq!(elapsed.seconds(), 0);
        assert_eq!(elapsed.tick(), 1);
    }

    #[test]
    fn clones_share_counter() {
        let elapsed = ElapsedSeconds::new();
        let observer = elapsed.observer();

        observer();
        observer();
        observer();

        assert_eq!(elapsed.seconds(), 3);
    }

    #[tokio::test]
    async fn tick_before_wait_is_not_lost() {
        let elapsed = ElapsedSeconds::new();
        elapsed.tick();

        let woke = tokio::time::timeout(Duration::from_secs(1), elapsed.changed()).await;
        assert!(woke.is_ok(), "changed() should resolve from the stored permit");
        assert_eq!(elapsed.seconds(), 1);
    }
}
