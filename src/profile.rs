//! The register configuration the driver programs into the chip.
//!
//! Applying a profile is total and ordered: every entry of [entries] is written exactly
//! once, in table order.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Addresses of the configuration registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Iocfg2 = 0x00,
    Iocfg1 = 0x01,
    Iocfg0 = 0x02,
    Fifothr = 0x03,
    Sync1 = 0x04,
    Sync0 = 0x05,
    Pktlen = 0x06,
    Pktctrl1 = 0x07,
    Pktctrl0 = 0x08,
    Addr = 0x09,
    Channr = 0x0A,
    Fsctrl1 = 0x0B,
    Fsctrl0 = 0x0C,
    Freq2 = 0x0D,
    Freq1 = 0x0E,
    Freq0 = 0x0F,
    Mdmcfg4 = 0x10,
    Mdmcfg3 = 0x11,
    Mdmcfg2 = 0x12,
    Mdmcfg1 = 0x13,
    Mdmcfg0 = 0x14,
    Deviatn = 0x15,
    Mcsm2 = 0x16,
    Mcsm1 = 0x17,
    Mcsm0 = 0x18,
    Foccfg = 0x19,
    Bscfg = 0x1A,
    Agcctrl2 = 0x1B,
    Agcctrl1 = 0x1C,
    Agcctrl0 = 0x1D,
    Worevt1 = 0x1E,
    Worevt0 = 0x1F,
    Worctrl = 0x20,
    Frend1 = 0x21,
    Frend0 = 0x22,
    Fscal3 = 0x23,
    Fscal2 = 0x24,
    Fscal1 = 0x25,
    Fscal0 = 0x26,
    Rcctrl1 = 0x27,
    Rcctrl0 = 0x28,
    Fstest = 0x29,
    Ptest = 0x2A,
    Agctest = 0x2B,
    Test2 = 0x2C,
    Test1 = 0x2D,
    Test0 = 0x2E,
}

/// The supported center frequency bands.
///
/// The discriminants are the selectors used by the chip vendor's reference firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Band {
    Mhz915 = 0x01,
    Mhz433 = 0x02,
    Mhz868 = 0x03,
}

impl Band {
    /// FREQ2, FREQ1 and FREQ0 for a 26 MHz crystal
    pub const fn frequency_registers(self) -> [(Register, u8); 3] {
        let [freq2, freq1, freq0] = match self {
            Band::Mhz915 => [0x22, 0xB1, 0x3B],
            Band::Mhz433 => [0x10, 0xA7, 0x62],
            Band::Mhz868 => [0x21, 0x62, 0x76],
        };

        [
            (Register::Freq2, freq2),
            (Register::Freq1, freq1),
            (Register::Freq0, freq0),
        ]
    }
}

/// Frequency synthesizer control, written before the band registers
pub const CALIBRATION: [(Register, u8); 2] = [(Register::Fsctrl1, 0x08), (Register::Fsctrl0, 0x00)];

/// Registers shared by all bands, written after the band registers
pub const SHARED: [(Register, u8); 29] = [
    (Register::Mdmcfg4, 0x5B),
    (Register::Mdmcfg3, 0xF8),
    // 2-FSK, 30/32 sync word bits
    (Register::Mdmcfg2, 0x03),
    (Register::Mdmcfg1, 0x22),
    (Register::Mdmcfg0, 0xF8),
    (Register::Channr, 0x00),
    (Register::Deviatn, 0x47),
    (Register::Frend1, 0xB6),
    (Register::Frend0, 0x10),
    // Calibrate when going from idle to RX or TX
    (Register::Mcsm0, 0x18),
    (Register::Foccfg, 0x1D),
    (Register::Bscfg, 0x1C),
    (Register::Agcctrl2, 0xC7),
    (Register::Agcctrl1, 0x00),
    (Register::Agcctrl0, 0xB2),
    (Register::Fscal3, 0xEA),
    (Register::Fscal2, 0x2A),
    (Register::Fscal1, 0x00),
    (Register::Fscal0, 0x11),
    (Register::Fstest, 0x59),
    (Register::Test2, 0x81),
    (Register::Test1, 0x35),
    (Register::Test0, 0x09),
    // Serial clock
    (Register::Iocfg2, 0x0B),
    // Asserts on sync word sent/received, deasserts at end of packet
    (Register::Iocfg0, 0x06),
    // Append RSSI and LQI/CRC_OK to received payloads
    (Register::Pktctrl1, 0x04),
    // No whitening, CRC on, variable length from the first byte after the sync word
    (Register::Pktctrl0, 0x05),
    (Register::Addr, 0x00),
    // Max packet length (61)
    (Register::Pktlen, 0x3D),
];

pub const DEFAULT_PA_TABLE: [u8; 8] = [0x60; 8];

/// All register writes of a configuration pass, in order.
///
/// Without a band the frequency registers are skipped. Everything else is still written.
pub fn entries(band: Option<Band>) -> impl Iterator<Item = (Register, u8)> {
    let frequency = band.map(Band::frequency_registers);

    CALIBRATION
        .into_iter()
        .chain(frequency.into_iter().flatten())
        .chain(SHARED)
}
