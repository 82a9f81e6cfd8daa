//! Doorlock protocol core logic
//!
//! Pure state machines for both nodes of the door-access controller,
//! completely decoupled from I/O. This enables deterministic testing of the
//! two-node protocol without hardware, serial ports or wall-clock time.
//!
//! # Architecture
//!
//! Each node is a deterministic state machine fed with events (a byte from
//! the link, a key press, a tick of the elapsed-seconds counter, a credential
//! read back from the store). Transitions return declarative actions (send
//! these bytes, show this screen, drive the actuator, persist this
//! credential) which a runtime or test harness executes in order.
//!
//! The original firmware busy-waits on a shared seconds counter and on the
//! next UART byte. Here every such wait is a phase of the machine with an
//! explicit predicate that is re-evaluated when the matching event arrives.
//! None of the waits has a timeout: a peer that never sends the expected
//! byte leaves its counterpart waiting forever, exactly as the protocol
//! defines it.
//!
//! # Components
//!
//! - [`exchange`]: three-step handshakes shared by both nodes
//! - [`hmi`]: user-facing node (capture, confirm, menu, lockout)
//! - [`control`]: authoritative node (compare, persist, actuate, lockout)
//! - [`lockout`]: consecutive-failure counter
//! - [`actuator`]: three-phase door timeline
//! - [`tick`]: shared elapsed-seconds counter and tick subscription
//! - [`store`]: credential vault over a byte-addressable EEPROM
//! - [`mod@env`]: environment abstraction (time, sleep)

pub mod actuator;
pub mod control;
pub mod env;
pub mod error;
pub mod exchange;
pub mod hmi;
pub mod lockout;
pub mod store;
pub mod tick;
pub mod timing;

pub use error::MachineError;
pub use timing::{Deadline, Timing};
