//! The chip-managed variable length packet format.
//!
//! On air a packet is `[length][payload][RSSI][LQI | CRC_OK]`. Only the payload is part of
//! the caller's buffer: the length is written/read by the driver and the two status bytes
//! are appended by the chip on reception.

/// Largest payload the configured packet length register allows
pub const MAX_PAYLOAD_LEN: usize = 61;
/// Bytes the chip appends to a received payload
pub const STATUS_LEN: usize = 2;

/// RSSI offset in dB (433 MHz, 38.4 kBaud region of the datasheet table)
const RSSI_OFFSET_DB: i16 = 74;

/// The status bytes appended to a received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct PacketStatus {
    /// Signal strength while the packet was received, in dBm
    pub rssi_dbm: i16,
    /// Link quality indicator. Lower is better
    pub lqi: u8,
    /// The CRC of the packet matched
    pub crc_ok: bool,
}

impl PacketStatus {
    pub fn from_bytes([rssi, lqi]: [u8; STATUS_LEN]) -> Self {
        Self {
            rssi_dbm: rssi_to_dbm(rssi),
            lqi: lqi & 0x7F,
            crc_ok: lqi & 0x80 != 0,
        }
    }
}

/// Convert the raw two's complement half-dB RSSI reading to dBm
pub fn rssi_to_dbm(raw: u8) -> i16 {
    (raw as i8) as i16 / 2 - RSSI_OFFSET_DB
}

/// The result of reading out the RX FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum RxResult {
    /// A packet was read into the buffer
    Ok {
        /// The size of the received payload in bytes
        packet_size: usize,
        status: PacketStatus,
    },
    /// The RX FIFO held nothing
    Empty,
    /// The packet announced a length bigger than the given buffer (or the packet format).
    /// Nothing was copied and the FIFO has been flushed.
    TooBigForBuffer {
        /// The length byte of the packet
        packet_size: usize,
    },
}

impl RxResult {
    /// Number of payload bytes written to the buffer
    pub fn len(&self) -> usize {
        match self {
            RxResult::Ok { packet_size, .. } => *packet_size,
            RxResult::Empty | RxResult::TooBigForBuffer { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
