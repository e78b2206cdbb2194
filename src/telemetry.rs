//! Outbound telemetry: chunk encoding and the transport port.
//!
//! Wire format per sample (transmit characteristic, notify):
//! ```text
//! chunk 1: eCO2 as decimal ASCII, NUL-padded to 20 bytes
//! chunk 2: TVOC as decimal ASCII, NUL-padded to 20 bytes
//! ```
//! No units, framing or sequence numbers.

use core::fmt::Write;

use crate::config::CHUNK_LEN;
use crate::error::TransportError;
use crate::sensor::Measurement;
use heapless::String;

/// One fixed-size outbound payload.
pub type Chunk = [u8; CHUNK_LEN];

/// Outbound half of the BLE UART transport.
pub trait Transport {
    /// Send one chunk on the transmit characteristic.
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), TransportError>;

    /// Make the peripheral discoverable again.
    fn start_advertising(&mut self);
}

/// Encode `value` as decimal text in a zeroed chunk.
pub fn encode_decimal(value: u16) -> Chunk {
    let mut text: String<CHUNK_LEN> = String::new();
    // u16 needs at most 5 digits.
    let _ = write!(&mut text, "{}", value);

    let mut chunk = [0u8; CHUNK_LEN];
    chunk[..text.len()].copy_from_slice(text.as_bytes());
    chunk
}

/// The two chunks of one sample, eCO2 first.
pub fn encode_measurement(m: &Measurement) -> [Chunk; 2] {
    [encode_decimal(m.eco2_ppm), encode_decimal(m.tvoc_ppb)]
}

/// Text part of a chunk (up to the first NUL).
pub fn chunk_text(chunk: &Chunk) -> &str {
    let end = chunk.iter().position(|&b| b == 0).unwrap_or(CHUNK_LEN);
    core::str::from_utf8(&chunk[..end]).unwrap_or("")
}
