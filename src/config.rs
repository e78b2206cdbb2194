//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, protocol constants and pin choices live here
//! so they can be tuned in one place. Nothing is configurable at run time.

// BLE

/// Shortened local name carried in the advertising payload and GAP.
pub const DEVICE_NAME: &str = "SDT Device";

/// Advertising interval (ms).
pub const ADV_INTERVAL_MS: u32 = 1000;

/// Advertising interval in SoftDevice units of 0.625 ms.
pub const ADV_INTERVAL_UNITS: u32 = ADV_INTERVAL_MS * 1000 / 625;

/// Nordic UART Service, 6E400001-B5A3-F393-E0A9-E50E24DCCA9E (little-endian).
pub const NUS_SERVICE_UUID: [u8; 16] = [
    0x9E, 0xCA, 0xDC, 0x24, 0x0E, 0xE5, 0xA9, 0xE0, 0x93, 0xF3, 0xA3, 0xB5, 0x01, 0x00, 0x40, 0x6E,
];

/// NUS receive characteristic (client writes commands here), 6E400002-...
pub const NUS_RX_UUID: [u8; 16] = [
    0x9E, 0xCA, 0xDC, 0x24, 0x0E, 0xE5, 0xA9, 0xE0, 0x93, 0xF3, 0xA3, 0xB5, 0x02, 0x00, 0x40, 0x6E,
];

/// NUS transmit characteristic (telemetry notifications), 6E400003-...
pub const NUS_TX_UUID: [u8; 16] = [
    0x9E, 0xCA, 0xDC, 0x24, 0x0E, 0xE5, 0xA9, 0xE0, 0x93, 0xF3, 0xA3, 0xB5, 0x03, 0x00, 0x40, 0x6E,
];

/// Fixed size of one outbound chunk and of the receive characteristic.
/// 20 bytes = default ATT MTU (23) minus the 3-byte notification header.
pub const CHUNK_LEN: usize = 20;

// Dispatcher

/// Run-queue slots. Treated as a hard operational ceiling.
pub const QUEUE_CAPACITY: usize = 16;

/// Run-queue slots held back for link events (Connected / Disconnected).
/// The link task waits for the restart request before it can report the
/// next connection, so at most one of each is ever queued.
pub const LINK_EVENT_RESERVE: usize = 2;

/// Pending timers (gate-check, indicator blink, in-flight sample polls
/// and transmits).
pub const TIMER_CAPACITY: usize = 8;

// Sampling

/// Period of the gate-check that decides whether to sample (ms).
pub const SAMPLE_PERIOD_MS: u32 = 1000;

/// Delay between reading the sensor and transmitting the result (ms).
pub const SETTLE_DELAY_MS: u32 = 1000;

/// Gap between two status polls while waiting for data-ready (ms).
pub const SENSOR_POLL_INTERVAL_MS: u32 = 10;

/// Give up on a sampling cycle if data-ready has not appeared by then (ms).
pub const SENSOR_POLL_TIMEOUT_MS: u32 = 2000;

/// Status polls after `init()` before start-up is declared failed.
pub const STARTUP_POLL_ATTEMPTS: u32 = 100;

/// Gap between start-up status polls (ms).
pub const STARTUP_POLL_INTERVAL_MS: u32 = 10;

/// Pause after the sensor reports operational, before the radio comes up (ms).
pub const STARTUP_SETTLE_MS: u32 = 1000;

// CCS811

/// 7-bit I²C address (ADDR pin low).
pub const CCS811_ADDRESS: u8 = 0x5A;

/// STATUS bit: a new sample is ready in ALG_RESULT_DATA.
pub const STATUS_DATA_READY: u8 = 0x08;

/// STATUS bits: FW_MODE (application running) | APP_VALID.
pub const STATUS_OPERATIONAL: u8 = 0x90;

// Indicator

/// Period of the connected-state indicator blink (ms).
pub const BLINK_PERIOD_MS: u32 = 1000;

/// The three on-board LEDs. One of them is the status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorLed {
    Red,
    Green,
    Blue,
}

/// LED used as the status indicator, resolved to a pin once at start-up.
pub const STATUS_LED: IndicatorLed = IndicatorLed::Blue;

// GPIO pin assignments (SDT52832B-style board)
//
// Logical names only; the `embassy_nrf::peripherals::*` types are picked
// in `main.rs` and handed to `board`. Adjust for your PCB.
//
//   LED red        → P0.17   (active low)
//   LED green      → P0.18   (active low)
//   LED blue       → P0.19   (active low)
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   CCS811 nWAKE   → P0.22   (held low)
