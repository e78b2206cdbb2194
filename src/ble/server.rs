//! Nordic UART Service GATT server.
//!
//! Built by hand with the SoftDevice service builder instead of the
//! `gatt_server` derive so that every write reaches the command
//! interpreter with its raw attribute handle; the interpreter decides
//! which handle is the receive characteristic.

use airstream::command::InboundFrame;
use airstream::config::{CHUNK_LEN, NUS_RX_UUID, NUS_SERVICE_UUID, NUS_TX_UUID};
use airstream::Error;
use defmt::info;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, WriteOp};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::Softdevice;

pub struct UartServer {
    rx_handle: u16,
    tx_handle: u16,
}

impl UartServer {
    /// Register the service and its two characteristics.
    pub fn new(sd: &mut Softdevice) -> Result<Self, Error> {
        let mut service = ServiceBuilder::new(sd, Uuid::new_128(&NUS_SERVICE_UUID))
            .map_err(|_| Error::BleInit)?;

        let rx = service
            .add_characteristic(
                Uuid::new_128(&NUS_RX_UUID),
                Attribute::new([0u8; CHUNK_LEN]).variable_len(CHUNK_LEN as u16),
                Metadata::new(Properties::new().write().write_without_response()),
            )
            .map_err(|_| Error::BleInit)?
            .build();

        let tx = service
            .add_characteristic(
                Uuid::new_128(&NUS_TX_UUID),
                Attribute::new([0u8; CHUNK_LEN]).variable_len(CHUNK_LEN as u16),
                Metadata::new(Properties::new().notify()),
            )
            .map_err(|_| Error::BleInit)?
            .build();

        let _service_handle = service.build();

        info!(
            "NUS registered: rx handle {=u16}, tx handle {=u16}",
            rx.value_handle, tx.value_handle
        );

        Ok(Self {
            rx_handle: rx.value_handle,
            tx_handle: tx.value_handle,
        })
    }

    /// Value handle of the characteristic the client writes commands to.
    pub fn rx_handle(&self) -> u16 {
        self.rx_handle
    }

    /// Value handle of the notify characteristic carrying telemetry.
    pub fn tx_handle(&self) -> u16 {
        self.tx_handle
    }
}

impl gatt_server::Server for UartServer {
    type Event = InboundFrame;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        Some(InboundFrame::new(handle, data))
    }
}
