//! Scenario tests with mandatory oracles.
//!
//! A scenario is a script of user actions and waits played against a fresh
//! [`World`]. It cannot run without an oracle, so every scenario ends with
//! an explicit check of the final state.

mod builder;
pub mod oracle;

pub use builder::{RunnableScenario, Scenario, Step};

use crate::World;

/// Result of an oracle check.
pub type OracleResult = Result<(), String>;

/// Verifies the world after the script ran.
pub type OracleFn = Box<dyn Fn(&World) -> OracleResult>;
