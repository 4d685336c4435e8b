//! Software SPI (mode 0, MSB first) over three discrete lines.
//!
//! Chip-select is not handled here. Framing is the job of [crate::ll::Bus].

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::ll::{DeviceError, Line};

/// Per-bit delays of the software clock, in microseconds.
///
/// The chip samples data-out on the rising clock edge and drives data-in before it,
/// so the order of the delays matters as much as their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct BitTiming {
    /// After driving data-out, before sampling data-in
    pub settle_us: u32,
    /// After sampling data-in, before the rising edge
    pub setup_us: u32,
    /// Clock high time
    pub hold_us: u32,
}

impl Default for BitTiming {
    fn default() -> Self {
        Self {
            settle_us: 20,
            setup_us: 30,
            hold_us: 60,
        }
    }
}

/// The bit-banged transport
#[derive(Debug)]
pub struct BitBang<Sck, Mosi, Miso, Delay> {
    sck: Sck,
    mosi: Mosi,
    miso: Miso,
    delay: Delay,
    timing: BitTiming,
}

impl<Sck, Mosi, Miso, Delay> BitBang<Sck, Mosi, Miso, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Delay: DelayNs,
{
    pub const fn new(sck: Sck, mosi: Mosi, miso: Miso, delay: Delay, timing: BitTiming) -> Self {
        Self {
            sck,
            mosi,
            miso,
            delay,
            timing,
        }
    }

    pub fn timing(&self) -> BitTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: BitTiming) {
        self.timing = timing;
    }

    /// Shift `out` onto data-out while shifting data-in into the returned byte
    pub fn transfer(&mut self, out: u8) -> Result<u8, DeviceError> {
        let mut received = 0u8;

        self.set_clock(false)?;

        for bit in (0..8).rev() {
            self.set_data_out(out & (1 << bit) != 0)?;
            self.delay.delay_us(self.timing.settle_us);

            received = (received << 1) | self.data_in()? as u8;
            self.delay.delay_us(self.timing.setup_us);

            self.set_clock(true)?;
            self.delay.delay_us(self.timing.hold_us);
            self.set_clock(false)?;
        }

        Ok(received)
    }

    /// Level of the data-in line.
    ///
    /// While chip-select is asserted this is the chip's ready line (low = ready).
    pub fn data_in(&mut self) -> Result<bool, DeviceError> {
        self.miso
            .is_high()
            .map_err(|e| DeviceError::pin(Line::DataIn, e))
    }

    /// Clock high, data-out low. The level the chip wants to see around a manual reset.
    pub fn park(&mut self) -> Result<(), DeviceError> {
        self.set_clock(true)?;
        self.set_data_out(false)
    }

    pub fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn set_clock(&mut self, high: bool) -> Result<(), DeviceError> {
        self.sck
            .set_state(high.into())
            .map_err(|e| DeviceError::pin(Line::Clock, e))
    }

    fn set_data_out(&mut self, high: bool) -> Result<(), DeviceError> {
        self.mosi
            .set_state(high.into())
            .map_err(|e| DeviceError::pin(Line::DataOut, e))
    }
}
