//! State machine error types.

use thiserror::Error;

/// Errors raised by the node state machines.
///
/// Protocol deviations by the peer are never errors: unexpected bytes are
/// discarded while the machine keeps waiting. These errors only describe
/// misuse by the driver, such as feeding an event the current phase cannot
/// accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// Event is not valid in the current phase.
    #[error("invalid state: cannot handle {event} while {phase}")]
    InvalidState {
        /// Human-readable phase name.
        phase: &'static str,
        /// Event that was rejected.
        event: &'static str,
    },
}
