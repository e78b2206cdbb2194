//! Unified error type for airstream.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for on-target logging when the `defmt`
//! feature is enabled.

/// Top-level error type used across the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Dispatcher
    /// All run-queue slots are occupied; the task was dropped.
    QueueFull,

    /// All timer slots are occupied; the timer was not armed.
    TimerSlotsFull,

    // Sensor
    /// The sensor adapter reported a failure.
    Sensor(SensorError),

    /// The sensor never reached its operational status after `init()`.
    SensorStartup,

    // Transport
    /// The transport adapter could not send or advertise.
    Transport(TransportError),

    /// GATT service registration with the BLE stack failed.
    BleInit,
}

/// Failures reported by a sensor adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I²C transaction failed.
    Bus,
    /// The device raised its ERROR status bit (carries ERROR_ID).
    Device(u8),
}

/// Failures reported by a transport adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No central is connected.
    NotConnected,
    /// The stack refused the notification (CCCD off, buffers full).
    NotifyFailed,
}

// Convenience conversions

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Error::Sensor(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}
