//! Board adapters for the core port traits.
//!
//! - `ccs811` - the air sensor on TWIM0 ([`airstream::AirSensor`])
//! - `led`    - the status LED ([`airstream::Indicator`])

pub mod ccs811;
pub mod led;

pub use ccs811::Ccs811;
pub use led::StatusLed;
