//! Doorlock production runtime.
//!
//! Executes the Sans-IO machines from `doorlock-core` against real I/O:
//! - Tokio for the async runtime and the one-second tick
//! - Any duplex byte stream as the serial link (TCP in the binaries)
//! - A file-backed EEPROM image for the credential
//!
//! ## Architecture
//!
//! ```text
//! doorlock-node
//!   ├─ SystemEnv        (production Environment impl)
//!   ├─ IntervalTicker   (TickSource over tokio::time::interval)
//!   ├─ FileEeprom       (durable Eeprom image)
//!   ├─ peripherals      (keypad, display, actuator, alarm)
//!   ├─ ControlNode      (ControlMachine + vault + actuator + alarm)
//!   └─ HmiNode          (HmiMachine + keypad + display)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod control_node;
mod eeprom;
mod error;
mod hmi_node;
pub mod link;
pub mod peripherals;
mod system_env;
mod ticker;

pub use control_node::{ControlNode, ControlNodeConfig};
pub use eeprom::FileEeprom;
pub use error::NodeError;
pub use hmi_node::{DEFAULT_MESSAGE_HOLD, HmiNode, HmiNodeConfig};
pub use system_env::SystemEnv;
pub use ticker::IntervalTicker;
