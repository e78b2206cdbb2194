//! Advertising payload assembly.
//!
//! Builds the legacy (31-byte) advertising and scan-response payloads as a
//! sequence of AD structures `[len][type][data...]`.

use heapless::Vec;

/// Maximum legacy advertising / scan-response payload length.
pub const MAX_AD_LEN: usize = 31;

/// AD type: Flags.
pub const AD_FLAGS: u8 = 0x01;
/// AD type: Complete list of 128-bit service UUIDs.
pub const AD_COMPLETE_UUID128: u8 = 0x07;
/// AD type: Shortened local name.
pub const AD_SHORTENED_NAME: u8 = 0x08;

/// LE General Discoverable | BR/EDR not supported.
pub const FLAGS_GENERAL_DISC_NO_BREDR: u8 = 0x02 | 0x04;

pub type AdPayload = Vec<u8, MAX_AD_LEN>;

/// Advertising data plus scan response for a connectable peripheral.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Advertisement {
    pub adv_data: AdPayload,
    pub scan_data: AdPayload,
}

impl Advertisement {
    /// Flags and shortened local name go in the advertising data; the
    /// 128-bit service UUID follows if it fits, otherwise it moves to the
    /// scan response.
    pub fn connectable(name: &str, service_uuid: &[u8; 16]) -> Self {
        let mut adv = Self::default();
        push_field(&mut adv.adv_data, AD_FLAGS, &[FLAGS_GENERAL_DISC_NO_BREDR]);

        let name = name.as_bytes();
        let room = MAX_AD_LEN - adv.adv_data.len() - 2;
        push_field(&mut adv.adv_data, AD_SHORTENED_NAME, &name[..name.len().min(room)]);

        if !push_field(&mut adv.adv_data, AD_COMPLETE_UUID128, service_uuid) {
            push_field(&mut adv.scan_data, AD_COMPLETE_UUID128, service_uuid);
        }
        adv
    }
}

/// Append one AD structure. Returns `false` (leaving `buf` untouched) if
/// it does not fit.
pub fn push_field(buf: &mut AdPayload, ad_type: u8, data: &[u8]) -> bool {
    if buf.len() + 2 + data.len() > MAX_AD_LEN {
        return false;
    }
    let _ = buf.push(data.len() as u8 + 1);
    let _ = buf.push(ad_type);
    let _ = buf.extend_from_slice(data);
    true
}
