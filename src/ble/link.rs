//! Advertising / connection loop and the outbound transport adapter.
//!
//! One central at a time. After a disconnection the loop parks until the
//! controller asks for advertising to resume, so the restart stays a
//! decision of the connection state machine.

use core::cell::RefCell;

use crate::ble::UartServer;
use crate::dispatch;
use airstream::advertising::Advertisement;
use airstream::config;
use airstream::error::TransportError;
use airstream::{Chunk, Task, Transport};
use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::Softdevice;

/// The live connection, if any. Written only by [`peripheral_task`].
static CONNECTION: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

/// Raised by the controller (via [`BleUart::start_advertising`]).
static RESUME_ADVERTISING: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Advertise, serve one connection, repeat when told to.
#[embassy_executor::task]
pub async fn peripheral_task(sd: &'static Softdevice, server: &'static UartServer) -> ! {
    let adv = Advertisement::connectable(config::DEVICE_NAME, &config::NUS_SERVICE_UUID);
    let adv_config = peripheral::Config {
        interval: config::ADV_INTERVAL_UNITS,
        ..Default::default()
    };

    loop {
        let payload = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv.adv_data,
            scan_data: &adv.scan_data,
        };

        info!("Start advertising");
        let conn = match peripheral::advertise_connectable(sd, payload, &adv_config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Advertising failed: {:?}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };

        CONNECTION.lock(|c| *c.borrow_mut() = Some(conn.clone()));
        dispatch::post_link_event(Task::Connected).await;

        // Runs until the central goes away.
        let _ = gatt_server::run(&conn, server, |frame| {
            dispatch::post(Task::DataWritten(frame));
        })
        .await;
        debug!("GATT server loop ended");

        CONNECTION.lock(|c| *c.borrow_mut() = None);
        dispatch::post_link_event(Task::Disconnected).await;

        RESUME_ADVERTISING.wait().await;
    }
}

/// Telemetry sink on the NUS transmit characteristic.
pub struct BleUart {
    tx_handle: u16,
}

impl BleUart {
    pub const fn new(tx_handle: u16) -> Self {
        Self { tx_handle }
    }
}

impl Transport for BleUart {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), TransportError> {
        let conn = CONNECTION
            .lock(|c| c.borrow().clone())
            .ok_or(TransportError::NotConnected)?;
        gatt_server::notify_value(&conn, self.tx_handle, chunk)
            .map_err(|_| TransportError::NotifyFailed)
    }

    fn start_advertising(&mut self) {
        RESUME_ADVERTISING.signal(());
    }
}
