//! Low level register and interface definitions

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    bitbang::{BitBang, BitTiming},
    poll::{poll_until, PollOutcome, Spin},
};

device_driver::create_device!(
    device_name: Device,
    manifest: "device.yaml"
);

/// Read flag of the header byte
pub const READ: u8 = 0x80;
/// Burst flag of the header byte
pub const BURST: u8 = 0x40;
/// The address bits of the header byte
pub const ADDRESS_MASK: u8 = 0x3F;

/// Power amplifier ramp table (8 bytes)
pub const PATABLE: u8 = 0x3E;
/// Single access to this address hits one FIFO byte, burst access streams through it.
/// Writes land in the TX FIFO, reads come from the RX FIFO.
pub const FIFO: u8 = 0x3F;
/// Reset strobe. Used raw by [Bus::reset] because the reset sequence has its own framing.
pub const SRES: u8 = 0x30;

/// First and last address of the status registers (read with [BURST] set) and strobes
const STATUS_REGISTERS: core::ops::RangeInclusive<u8> = 0x30..=0x3D;

/// The kind of a single bus transaction. Selected by the flags or-ed into the header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Access {
    SingleWrite,
    BurstWrite,
    SingleRead,
    BurstRead,
    /// Command only, no data phase
    Strobe,
    /// Single byte read of a status register
    Status,
}

impl Access {
    pub const fn flags(self) -> u8 {
        match self {
            Access::SingleWrite | Access::Strobe => 0,
            Access::BurstWrite => BURST,
            Access::SingleRead => READ,
            Access::BurstRead | Access::Status => READ | BURST,
        }
    }
}

/// Build the header byte for a transaction on `address`
pub const fn header(address: u8, access: Access) -> u8 {
    (address & ADDRESS_MASK) | access.flags()
}

/// The signals owned by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Line {
    Clock,
    DataOut,
    /// Data-in, doubling as the ready line while chip-select is asserted
    DataIn,
    ChipSelect,
    /// GDO0, the packet done signal
    Done,
}

/// Low level interface error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DeviceError {
    /// A line could not be driven or sensed
    Pin {
        line: Line,
        kind: embedded_hal::digital::ErrorKind,
    },
    /// A bounded wait on a line ran out of polls
    Timeout { line: Line },
}

impl DeviceError {
    pub(crate) fn pin(line: Line, error: impl embedded_hal::digital::Error) -> Self {
        Self::Pin {
            line,
            kind: error.kind(),
        }
    }
}

impl PollOutcome {
    /// Turn a timed out wait on `line` into an error
    pub fn ready_or_timeout(self, line: Line) -> Result<(), DeviceError> {
        match self {
            PollOutcome::Ready => Ok(()),
            PollOutcome::TimedOut => {
                #[cfg(feature = "defmt-03")]
                defmt::warn!("Timed out waiting on {}", line);

                Err(DeviceError::Timeout { line })
            }
        }
    }
}

/// The framed register protocol on top of the bit-banged transport.
///
/// Every transaction asserts chip-select, waits for the chip to pull the ready line low,
/// sends the header byte, runs its data phase and releases chip-select again.
#[derive(Debug)]
pub struct Bus<Sck, Mosi, Miso, Csn, Delay> {
    transport: BitBang<Sck, Mosi, Miso, Delay>,
    csn: Csn,
    spin: Spin,
}

impl<Sck, Mosi, Miso, Csn, Delay> Bus<Sck, Mosi, Miso, Csn, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Delay: DelayNs,
{
    pub const fn new(transport: BitBang<Sck, Mosi, Miso, Delay>, csn: Csn, spin: Spin) -> Self {
        Self {
            transport,
            csn,
            spin,
        }
    }

    pub fn spin(&self) -> Spin {
        self.spin
    }

    pub fn set_spin(&mut self, spin: Spin) {
        self.spin = spin;
    }

    pub fn timing(&self) -> BitTiming {
        self.transport.timing()
    }

    pub fn set_timing(&mut self, timing: BitTiming) {
        self.transport.set_timing(timing);
    }

    /// Put the lines in their power-up levels: chip-select released, clock high, data-out low
    pub fn idle_lines(&mut self) -> Result<(), DeviceError> {
        self.deselect()?;
        self.transport.park()
    }

    pub fn delay_us(&mut self, us: u32) {
        self.transport.delay_us(us);
    }

    /// Write a single configuration register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), DeviceError> {
        self.transaction(header(address, Access::SingleWrite), |transport| {
            transport.transfer(value)?;
            Ok(())
        })
    }

    /// Read a single configuration register
    pub fn read_register(&mut self, address: u8) -> Result<u8, DeviceError> {
        self.transaction(header(address, Access::SingleRead), |transport| {
            transport.transfer(0x00)
        })
    }

    /// Write `data` to consecutive registers (or the FIFO/PA table) starting at `address`
    pub fn write_burst(&mut self, address: u8, data: &[u8]) -> Result<(), DeviceError> {
        self.transaction(header(address, Access::BurstWrite), |transport| {
            data.iter()
                .try_for_each(|byte| transport.transfer(*byte).map(|_| ()))
        })
    }

    /// Fill `data` from consecutive registers (or the FIFO/PA table) starting at `address`
    pub fn read_burst(&mut self, address: u8, data: &mut [u8]) -> Result<(), DeviceError> {
        self.transaction(header(address, Access::BurstRead), |transport| {
            data.iter_mut().try_for_each(|byte| {
                *byte = transport.transfer(0x00)?;
                Ok(())
            })
        })
    }

    /// Send a command strobe. Returns the chip status byte clocked out during the header.
    pub fn strobe(&mut self, command: u8) -> Result<u8, DeviceError> {
        #[cfg(feature = "defmt-03")]
        defmt::trace!("Strobe {=u8:#X}", command);

        self.transaction_with_status(header(command, Access::Strobe), |_| Ok(()))
            .map(|(status, ())| status)
    }

    /// Read one of the status registers (0x30..=0x3D)
    pub fn read_status(&mut self, address: u8) -> Result<u8, DeviceError> {
        self.transaction(header(address, Access::Status), |transport| {
            transport.transfer(0x00)
        })
    }

    /// The manual reset sequence.
    ///
    /// Chip-select is pulsed low/high/low, and the reset strobe is sent in between two
    /// waits on the ready line without releasing chip-select.
    pub fn reset(&mut self) -> Result<(), DeviceError> {
        const PULSE_US: u32 = 200;

        self.select()?;
        self.delay_us(PULSE_US);
        self.deselect()?;
        self.delay_us(PULSE_US);
        self.select()?;

        let result = self.wait_ready().and_then(|()| {
            self.transport.transfer(SRES)?;
            self.wait_ready()
        });
        let released = self.deselect();

        result?;
        released
    }

    fn transaction<T>(
        &mut self,
        header: u8,
        data_phase: impl FnOnce(&mut BitBang<Sck, Mosi, Miso, Delay>) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        self.transaction_with_status(header, data_phase)
            .map(|(_, value)| value)
    }

    fn transaction_with_status<T>(
        &mut self,
        header: u8,
        data_phase: impl FnOnce(&mut BitBang<Sck, Mosi, Miso, Delay>) -> Result<T, DeviceError>,
    ) -> Result<(u8, T), DeviceError> {
        self.select()?;

        let result = self.wait_ready().and_then(|()| {
            let status = self.transport.transfer(header)?;
            let value = data_phase(&mut self.transport)?;
            Ok((status, value))
        });
        // Chip-select is released even when the transaction failed halfway
        let released = self.deselect();

        let value = result?;
        released?;
        Ok(value)
    }

    fn wait_ready(&mut self) -> Result<(), DeviceError> {
        let transport = &mut self.transport;
        poll_until(self.spin, false, || transport.data_in())?.ready_or_timeout(Line::DataIn)
    }

    fn select(&mut self) -> Result<(), DeviceError> {
        self.csn
            .set_low()
            .map_err(|e| DeviceError::pin(Line::ChipSelect, e))
    }

    fn deselect(&mut self) -> Result<(), DeviceError> {
        self.csn
            .set_high()
            .map_err(|e| DeviceError::pin(Line::ChipSelect, e))
    }
}

impl<Sck, Mosi, Miso, Csn, Delay> device_driver::RegisterInterface
    for &mut Bus<Sck, Mosi, Miso, Csn, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Delay: DelayNs,
{
    type Error = DeviceError;

    type AddressType = u8;

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        match data {
            [value] => Bus::write_register(self, address, *value),
            _ => self.write_burst(address, data),
        }
    }

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        match data {
            [value] if STATUS_REGISTERS.contains(&address) => {
                *value = self.read_status(address)?;
                Ok(())
            }
            [value] => {
                *value = Bus::read_register(self, address)?;
                Ok(())
            }
            _ => self.read_burst(address, data),
        }
    }
}

impl<Sck, Mosi, Miso, Csn, Delay> device_driver::CommandInterface
    for &mut Bus<Sck, Mosi, Miso, Csn, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Delay: DelayNs,
{
    type Error = DeviceError;
    type AddressType = u8;

    fn dispatch_command(
        &mut self,
        address: Self::AddressType,
        _size_bits_in: u32,
        _input: &[u8],
        _size_bits_out: u32,
        _output: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.strobe(address).map(|_| ())
    }
}
