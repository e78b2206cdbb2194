//! Inbound control commands from the connected client.
//!
//! Protocol (receive characteristic): the first byte of a write selects
//! the command, the rest is ignored.
//!
//! | Byte  | Command              |
//! |-------|----------------------|
//! | `'s'` | start streaming      |
//! | `'p'` | pause streaming      |
//! | other | ignored, no reply    |

use crate::config::CHUNK_LEN;
use heapless::Vec;

/// A GATT write as delivered by the transport: target handle plus data.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InboundFrame {
    pub handle: u16,
    pub data: Vec<u8, CHUNK_LEN>,
}

impl InboundFrame {
    /// Copy a write into a frame, truncating to the characteristic size.
    pub fn new(handle: u16, data: &[u8]) -> Self {
        let len = data.len().min(CHUNK_LEN);
        let mut buf = Vec::new();
        let _ = buf.extend_from_slice(&data[..len]);
        Self { handle, data: buf }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    StartStreaming,
    PauseStreaming,
}

impl Command {
    /// Decode the leading byte of a frame.
    pub fn decode(data: &[u8]) -> Option<Self> {
        match data.first()? {
            b's' => Some(Command::StartStreaming),
            b'p' => Some(Command::PauseStreaming),
            _ => None,
        }
    }
}

/// Filters writes down to the receive characteristic and decodes them.
#[derive(Clone, Copy, Debug)]
pub struct CommandInterpreter {
    rx_handle: u16,
}

impl CommandInterpreter {
    /// `rx_handle` is the value handle of the receive characteristic.
    pub const fn new(rx_handle: u16) -> Self {
        Self { rx_handle }
    }

    pub fn rx_handle(&self) -> u16 {
        self.rx_handle
    }

    /// Decode a frame; writes to any other handle (CCCDs, other
    /// characteristics) yield `None`.
    pub fn interpret(&self, frame: &InboundFrame) -> Option<Command> {
        if frame.handle != self.rx_handle {
            return None;
        }
        Command::decode(&frame.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RX: u16 = 0x0010;

    #[test]
    fn decodes_start_and_pause() {
        assert_eq!(Command::decode(b"s"), Some(Command::StartStreaming));
        assert_eq!(Command::decode(b"p"), Some(Command::PauseStreaming));
    }

    #[test]
    fn only_first_byte_matters() {
        assert_eq!(Command::decode(b"start"), Some(Command::StartStreaming));
        assert_eq!(Command::decode(b"ps"), Some(Command::PauseStreaming));
        assert_eq!(Command::decode(b"xs"), None);
    }

    #[test]
    fn ignores_empty_and_unknown() {
        assert_eq!(Command::decode(b""), None);
        assert_eq!(Command::decode(b"S"), None);
        assert_eq!(Command::decode(&[0x00]), None);
    }

    #[test]
    fn interpreter_filters_by_handle() {
        let interpreter = CommandInterpreter::new(RX);
        assert_eq!(
            interpreter.interpret(&InboundFrame::new(RX, b"s")),
            Some(Command::StartStreaming)
        );
        // CCCD write on the transmit characteristic, starting with 's' by chance.
        assert_eq!(interpreter.interpret(&InboundFrame::new(RX + 3, b"s")), None);
    }

    #[test]
    fn frame_truncates_oversized_writes() {
        let frame = InboundFrame::new(RX, &[b'p'; 64]);
        assert_eq!(frame.data.len(), CHUNK_LEN);
        assert_eq!(CommandInterpreter::new(RX).interpret(&frame), Some(Command::PauseStreaming));
    }
}
