//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S132 in **Peripheral** role:
//!
//! 1. **Server** - registers the Nordic UART Service (receive + transmit
//!    characteristics) and turns GATT writes into inbound frames.
//! 2. **Link** - advertises, accepts one central at a time, posts
//!    connect/disconnect/write tasks into the dispatcher and sends
//!    telemetry notifications.
//!
//! Nothing in here touches core state; every event becomes a posted task.

pub mod link;
pub mod server;

pub use link::{peripheral_task, BleUart};
pub use server::UartServer;

use airstream::config;
use core::mem;
use nrf_softdevice::{raw, Softdevice};

/// Enable the SoftDevice with a single-peripheral configuration.
pub fn enable_softdevice() -> &'static mut Softdevice {
    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    Softdevice::enable(&sd_config)
}

/// Run the SoftDevice event loop - must be spawned as a dedicated Embassy task.
#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
