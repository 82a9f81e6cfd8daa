//! Virtual clock for the simulated credential vault.

use std::{
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll, Waker},
    time::Duration,
};

use doorlock_core::env::Environment;

use crate::HarnessError;

/// Clock that only moves when told to or when slept on.
///
/// Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::AcqRel);
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }

    #[allow(clippy::manual_async_fn)]
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let clock = self.clone();
        async move { clock.advance(duration) }
    }
}

/// Drive a future that only awaits [`SimEnv`] sleeps to completion.
///
/// Polls exactly once. Anything that would need a real wakeup is reported
/// as [`HarnessError::Stalled`].
pub fn run_ready<F: Future>(future: F) -> Result<F::Output, HarnessError> {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(output) => Ok(output),
        Poll::Pending => Err(HarnessError::Stalled),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sleep_advances_shared_clock() {
        let env = SimEnv::new();
        let clone = env.clone();

        run_ready(env.sleep(Duration::from_millis(10))).unwrap();
        run_ready(clone.sleep(Duration::from_millis(5))).unwrap();

        assert_eq!(env.now(), Duration::from_millis(15));
        assert_eq!(clone.now(), Duration::from_millis(15));
    }

    #[test]
    fn pending_future_is_stalled() {
        let result = run_ready(std::future::pending::<()>());
        assert!(matches!(result, Err(HarnessError::Stalled)));
    }
}
