//! Air-quality sensor port and the polling logic built on it.
//!
//! The register protocol lives in the adapter (see `board/ccs811.rs` in
//! the firmware binary); here the sensor is only a status byte and a
//! (eCO2, TVOC) pair.

use crate::config::{
    STARTUP_POLL_ATTEMPTS, STARTUP_POLL_INTERVAL_MS, STARTUP_SETTLE_MS, STATUS_DATA_READY,
    STATUS_OPERATIONAL,
};
use crate::error::{Error, SensorError};
use embedded_hal::delay::DelayNs;

/// One reading: equivalent CO2 (ppm) and total VOC (ppb).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub eco2_ppm: u16,
    pub tvoc_ppb: u16,
}

impl Measurement {
    pub const fn new(eco2_ppm: u16, tvoc_ppb: u16) -> Self {
        Self { eco2_ppm, tvoc_ppb }
    }
}

/// Raw STATUS register value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorStatus(pub u8);

impl SensorStatus {
    /// A new sample is waiting to be read.
    pub fn data_ready(self) -> bool {
        self.0 & STATUS_DATA_READY != 0
    }

    /// Firmware is in application mode with a valid application loaded.
    pub fn operational(self) -> bool {
        self.0 & STATUS_OPERATIONAL == STATUS_OPERATIONAL
    }
}

/// Blocking sensor capability set.
pub trait AirSensor {
    /// Start the measurement application.
    fn init(&mut self) -> Result<(), SensorError>;

    /// Read the STATUS register.
    fn status(&mut self) -> Result<SensorStatus, SensorError>;

    /// Read the latest algorithm result.
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

/// How a sampling cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    Ready(Measurement),
    /// Data-ready never appeared before the cycle deadline.
    TimedOut,
    DeviceError(SensorError),
}

/// One non-blocking step of a sampling cycle.
///
/// Reads the status once. Returns `None` when the sensor is not ready yet
/// and `now_ms` is still before `deadline_ms`; the caller re-schedules the
/// step instead of spinning.
pub fn poll_step<S: AirSensor>(sensor: &mut S, now_ms: u64, deadline_ms: u64) -> Option<SampleOutcome> {
    let status = match sensor.status() {
        Ok(status) => status,
        Err(e) => return Some(SampleOutcome::DeviceError(e)),
    };

    if status.data_ready() {
        return Some(match sensor.read() {
            Ok(m) => SampleOutcome::Ready(m),
            Err(e) => SampleOutcome::DeviceError(e),
        });
    }

    if now_ms >= deadline_ms {
        Some(SampleOutcome::TimedOut)
    } else {
        None
    }
}

/// Bring the sensor into measurement mode.
///
/// Runs once before the dispatcher starts, so blocking on `delay` is fine
/// here. The wait for the operational bits is bounded; on success the
/// sensor is given a settle pause before the caller continues.
pub fn bring_up<S, D>(sensor: &mut S, delay: &mut D) -> Result<SensorStatus, Error>
where
    S: AirSensor,
    D: DelayNs,
{
    match sensor.status() {
        Ok(before) => info!("Status before init(): {=u8:#x}", before.0),
        Err(e) => warn!("Status before init() unreadable: {}", e),
    }

    sensor.init()?;

    for _ in 0..STARTUP_POLL_ATTEMPTS {
        match sensor.status() {
            Ok(status) if status.operational() => {
                info!("Status after init(): {=u8:#x}", status.0);
                delay.delay_ms(STARTUP_SETTLE_MS);
                return Ok(status);
            }
            Ok(_) => {}
            Err(e) => debug!("status read failed during start-up: {}", e),
        }
        delay.delay_ms(STARTUP_POLL_INTERVAL_MS);
    }

    error!("Sensor never reported operational status");
    Err(Error::SensorStartup)
}
