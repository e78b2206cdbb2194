//! Host-testable core of the airstream firmware.
//!
//! Everything here is pure logic that runs the same on the nRF52832 and
//! on the host: the run-to-completion dispatcher, the connection state
//! machine, the sampling cycle and the command interpreter. Hardware is
//! reached only through the port traits [`AirSensor`], [`Transport`] and
//! [`Indicator`].
//!
//! Usage: `cargo test --lib` / `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and supplies the SoftDevice, TWIM and GPIO adapters.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod advertising;
pub mod app;
pub mod command;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod sensor;
pub mod telemetry;

pub use app::{Controller, Hardware, Task};
pub use connection::{ConnectionState, Indicator};
pub use dispatcher::{CancelTimer, Dispatcher, Scheduler, TimerId};
pub use error::Error;
pub use sensor::{AirSensor, Measurement, SampleOutcome};
pub use telemetry::{Chunk, Transport};

/// Run queue sized for the firmware.
pub type TaskQueue = Dispatcher<Task, { config::QUEUE_CAPACITY }, { config::TIMER_CAPACITY }>;

/// Empty [`TaskQueue`] with the link-event slots reserved.
pub const fn new_task_queue() -> TaskQueue {
    TaskQueue::with_reserve(config::LINK_EVENT_RESERVE)
}
