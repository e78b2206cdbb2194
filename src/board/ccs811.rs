//! Minimal CCS811 register access over blocking I²C.
//!
//! Only what the sampling cycle needs: start the application firmware,
//! select drive mode 1 (one result per second), read STATUS and read
//! ALG_RESULT_DATA. No baseline, environment or threshold handling.
//!
//! TWIM reads its transmit buffer by EasyDMA, so register addresses are
//! copied into stack locals rather than passed as promoted constants.

use airstream::config::CCS811_ADDRESS;
use airstream::error::SensorError;
use airstream::sensor::{AirSensor, Measurement, SensorStatus};
use embassy_nrf::gpio::Output;
use embedded_hal::i2c::I2c;

const REG_STATUS: u8 = 0x00;
const REG_MEAS_MODE: u8 = 0x01;
const REG_ALG_RESULT_DATA: u8 = 0x02;
const REG_APP_START: u8 = 0xF4;

/// DRIVE_MODE = 1: constant power, measurement every second.
const MEAS_MODE_1S: u8 = 0x10;

/// STATUS bit: ERROR_ID holds a valid code.
const STATUS_ERROR: u8 = 0x01;

pub struct Ccs811<I2C> {
    i2c: I2C,
    // nWAKE must stay low for the device to answer on the bus.
    _wake: Output<'static>,
}

impl<I2C: I2c> Ccs811<I2C> {
    pub fn new(i2c: I2C, wake: Output<'static>) -> Self {
        Self { i2c, _wake: wake }
    }
}

impl<I2C: I2c> AirSensor for Ccs811<I2C> {
    fn init(&mut self) -> Result<(), SensorError> {
        let app_start = [REG_APP_START];
        self.i2c
            .write(CCS811_ADDRESS, &app_start)
            .map_err(|_| SensorError::Bus)?;
        let meas_mode = [REG_MEAS_MODE, MEAS_MODE_1S];
        self.i2c
            .write(CCS811_ADDRESS, &meas_mode)
            .map_err(|_| SensorError::Bus)
    }

    fn status(&mut self) -> Result<SensorStatus, SensorError> {
        let reg = [REG_STATUS];
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(CCS811_ADDRESS, &reg, &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(SensorStatus(buf[0]))
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        // eCO2 (2) | TVOC (2) | STATUS | ERROR_ID
        let reg = [REG_ALG_RESULT_DATA];
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(CCS811_ADDRESS, &reg, &mut buf)
            .map_err(|_| SensorError::Bus)?;

        if buf[4] & STATUS_ERROR != 0 {
            return Err(SensorError::Device(buf[5]));
        }

        Ok(Measurement::new(
            u16::from_be_bytes([buf[0], buf[1]]),
            u16::from_be_bytes([buf[2], buf[3]]),
        ))
    }
}
