//! Deterministic simulation harness for the doorlock protocol.
//!
//! Both state machines run in one thread against an in-memory link, a
//! recording EEPROM and a virtual clock. Nothing sleeps for real, so a full
//! door cycle or lockout completes in microseconds and every run with the
//! same inputs produces the same transcript.
//!
//! # Layout
//!
//! - [`World`]: the two machines, the link queues and everything observable
//! - [`scenario`]: declarative scripts that must end in an oracle check
//! - [`Operation`]: arbitrary user actions for model-based property tests
//! - [`SimEnv`]: virtual clock that advances when slept on

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod operation;
pub mod scenario;
mod sim_env;
mod world;

pub use error::HarnessError;
pub use operation::{Operation, PasswordChoice};
pub use sim_env::{SimEnv, run_ready};
pub use world::{Node, RecordingEeprom, Stamped, StoreOp, StoreOpKind, Transfer, World};
