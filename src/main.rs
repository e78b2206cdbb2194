//! airstream firmware entry point.
//!
//! Brings up the CCS811 on TWIM0, enables the SoftDevice with the Nordic
//! UART Service, then hands control to the task dispatcher.
//!
//! Build: `cargo build --release --features embedded --target thumbv7em-none-eabihf`

#![no_std]
#![no_main]

mod ble;
mod board;
mod dispatch;

use airstream::config;
use airstream::sensor::bring_up;
use airstream::{Controller, Hardware, Indicator};
use defmt::{error, info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static SERVER: StaticCell<ble::UartServer> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("< airstream: CCS811 eCO2/TVOC over BLE UART >");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut indicator = board::StatusLed::resolve(
        config::STATUS_LED,
        p.P0_17.degrade(),
        p.P0_18.degrade(),
        p.P0_19.degrade(),
    );
    indicator.set(true);

    // ── Sensor ───────────────────────────────────────────────────────
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let wake = Output::new(p.P0_22, Level::Low, OutputDrive::Standard);
    let mut sensor = board::Ccs811::new(i2c, wake);

    if let Err(e) = bring_up(&mut sensor, &mut Delay) {
        error!("Sensor start-up failed: {}", e);
    }

    // ── BLE ──────────────────────────────────────────────────────────
    let sd = ble::enable_softdevice();
    let server = match ble::UartServer::new(sd) {
        Ok(server) => Some(&*SERVER.init(server)),
        Err(e) => {
            error!("BLE initialization failed: {}", e);
            None
        }
    };
    unwrap!(spawner.spawn(ble::softdevice_task(sd)));

    // Without a server no writes can arrive and every notify reports
    // NotConnected, so handle 0 is never matched.
    let (rx_handle, tx_handle) = server.map_or((0, 0), |s| (s.rx_handle(), s.tx_handle()));

    if let Some(server) = server {
        info!("BLE initialization completed");
        unwrap!(spawner.spawn(ble::peripheral_task(sd, server)));
    }

    // ── Dispatcher ───────────────────────────────────────────────────
    let mut hw = Hardware {
        sensor,
        transport: ble::BleUart::new(tx_handle),
        indicator,
    };
    let mut controller = Controller::new(rx_handle);
    // Start-up took over a second; the first gate-check is one period from here.
    dispatch::sync_clock();
    if let Err(e) = controller.start(&mut dispatch::SharedQueue) {
        error!("Gate-check timer not armed: {}", e);
    }

    dispatch::run_forever(&mut controller, &mut hw).await
}
