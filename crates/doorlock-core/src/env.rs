//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples node logic from wall-clock time. The
//! only consumer inside the core is the credential vault, which must keep a
//! minimum settle delay between consecutive EEPROM operations.
//!
//! - Deterministic Simulation: the harness provides a virtual clock whose
//!   `sleep` advances time instantly.
//!
//! - Production Runtime: the node crate uses `std::time::Instant` and
//!   `tokio::time::sleep`.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Sleep: after `sleep(d)` resolves, `now()` has advanced by at least `d`

use std::{fmt::Debug, future::Future, ops::Sub, time::Duration};

/// Abstract environment providing time and sleeping.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Debug + Send + Sync + Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code and the vault use this; state machines never sleep.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
