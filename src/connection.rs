//! Peripheral connection lifecycle.
//!
//! ```text
//!            connected
//!   ┌──────────────┐ ─────────▶ ┌───────────┐
//!   │ Disconnected │            │ Connected │  indicator blinks 1 Hz
//!   └──────────────┘ ◀───────── └───────────┘
//!    indicator solid  disconnected
//!                     (re-advertise)
//! ```
//!
//! The streaming flag is deliberately left alone on both edges.

use crate::config::BLINK_PERIOD_MS;
use crate::dispatcher::{CancelTimer, Scheduler, TimerId};
use crate::error::Error;
use crate::telemetry::Transport;

/// Status LED port.
pub trait Indicator {
    /// Drive the LED on or off.
    fn set(&mut self, on: bool);

    /// Invert the LED.
    fn toggle(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Connection state plus the blink timer that belongs to it.
#[derive(Debug, Default)]
pub struct Link {
    state: ConnectionState,
    blink: Option<TimerId>,
}

impl Link {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            blink: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// A central connected: start blinking the indicator.
    ///
    /// `blink_task` is what the dispatcher should post every blink period.
    pub fn on_connected<T, Q>(&mut self, queue: &mut Q, blink_task: T) -> Result<(), Error>
    where
        Q: Scheduler<T>,
    {
        info!("Connected!");
        self.state = ConnectionState::Connected;
        if self.blink.is_none() {
            self.blink = Some(queue.post_periodic(BLINK_PERIOD_MS, blink_task)?);
        }
        Ok(())
    }

    /// The central went away: stop blinking, hold the indicator on and
    /// make the peripheral discoverable again.
    pub fn on_disconnected<Q, I, X>(&mut self, queue: &mut Q, indicator: &mut I, transport: &mut X)
    where
        Q: CancelTimer,
        I: Indicator,
        X: Transport,
    {
        info!("Disconnected!");
        self.state = ConnectionState::Disconnected;
        if let Some(id) = self.blink.take() {
            queue.cancel(id);
        }
        indicator.set(true);

        info!("Restarting the advertising process");
        transport.start_advertising();
    }

    /// Periodic blink. A tick released just before the link dropped is
    /// ignored so it cannot turn the solid indicator off.
    pub fn on_blink<I: Indicator>(&mut self, indicator: &mut I) {
        if self.is_connected() {
            indicator.toggle();
        }
    }
}
