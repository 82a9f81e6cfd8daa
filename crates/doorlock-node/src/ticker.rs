//! Periodic tick source backed by the tokio timer.

use std::time::Duration;

use doorlock_core::tick::{TickObserver, TickSource};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Calls its observer once per period from a background task.
///
/// Late ticks are delivered in a burst so the elapsed count catches up with
/// wall time. The task is aborted when the ticker is dropped, so the ticker
/// must outlive the node that reads the counter.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    /// Ticker with the given period. Nothing runs until
    /// [`TickSource::subscribe`].
    pub const fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// One tick per second.
    pub const fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicker {
    /// Must be called from within a tokio runtime.
    fn subscribe(&mut self, observer: TickObserver) {
        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                observer();
            }
        }));
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use doorlock_core::tick::ElapsedSeconds;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let elapsed = ElapsedSeconds::new();
        let mut ticker = IntervalTicker::seconds();
        ticker.subscribe(elapsed.observer());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(elapsed.seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let elapsed = ElapsedSeconds::new();
        let mut ticker = IntervalTicker::seconds();
        ticker.subscribe(elapsed.observer());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(elapsed.seconds(), 1);
    }
}
