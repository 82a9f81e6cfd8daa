//! Harness errors.

use doorlock_core::{MachineError, store::StoreError};
use thiserror::Error;

/// Why a simulated run stopped early.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A state machine rejected an event.
    #[error("state machine error: {0}")]
    Machine(#[from] MachineError),

    /// The simulated EEPROM failed.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// A future awaited something the simulation never completes.
    #[error("future stalled on the virtual clock")]
    Stalled,

    /// Bytes kept flowing without the link going quiet.
    #[error("link still busy after {deliveries} deliveries")]
    Livelock {
        /// Bytes delivered before giving up.
        deliveries: usize,
    },

    /// The scenario oracle rejected the final world.
    #[error("scenario '{scenario}' failed: {reason}")]
    Oracle {
        /// Scenario name.
        scenario: String,
        /// Oracle message.
        reason: String,
    },
}
