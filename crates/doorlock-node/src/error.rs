//! Node error types.

use doorlock_core::{MachineError, store::StoreError};
use thiserror::Error;

/// Errors that end a node runtime.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Link or socket I/O failed.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential store failed.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// State machine rejected an event.
    #[error("state machine error: {0}")]
    Machine(#[from] MachineError),

    /// The peer went away while this node was writing to it.
    #[error("link closed by peer")]
    LinkClosed,
}
