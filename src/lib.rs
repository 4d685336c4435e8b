#![cfg_attr(not(test), no_std)]

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use ll::{Bus, DeviceError, Line};
use poll::poll_until;

pub mod bitbang;
pub mod clock;
pub mod ll;
pub mod packet;
pub mod poll;
pub mod profile;
pub mod states;

#[cfg(test)]
mod sim;

pub use bitbang::BitTiming;
pub use packet::{PacketStatus, RxResult, MAX_PAYLOAD_LEN};
pub use poll::Spin;
pub use profile::Band;
pub use states::{
    addressable::{ChipInfo, MarcState},
    power_up::Config,
};

/// A CC1101 transceiver on a bit-banged bus.
///
/// `Gdo` is the GDO0 input, configured by the driver to assert on sync word and deassert
/// at the end of a packet.
pub struct Cc1101<State, Sck, Mosi, Miso, Csn, Gdo, Delay> {
    bus: Bus<Sck, Mosi, Miso, Csn, Delay>,
    gdo0: Gdo,
    pa_table: [u8; 8],
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    Device(DeviceError),
    /// The payload is longer than [MAX_PAYLOAD_LEN]
    BufferTooLarge,
}

impl From<DeviceError> for Error {
    fn from(v: DeviceError) -> Self {
        Self::Device(v)
    }
}

impl<State, Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<State, Sck, Mosi, Miso, Csn, Gdo, Delay> {
    fn cast_state<Next>(self, state: Next) -> Cc1101<Next, Sck, Mosi, Miso, Csn, Gdo, Delay> {
        Cc1101 {
            bus: self.bus,
            gdo0: self.gdo0,
            pa_table: self.pa_table,
            state,
        }
    }
}

impl<State, Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<State, Sck, Mosi, Miso, Csn, Gdo, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Gdo: InputPin,
    Delay: DelayNs,
{
    fn done_line(&mut self) -> Result<bool, DeviceError> {
        self.gdo0
            .is_high()
            .map_err(|e| DeviceError::pin(Line::Done, e))
    }

    /// Busy-wait until GDO0 reads `high`
    fn wait_done_line(&mut self, high: bool) -> Result<(), DeviceError> {
        #[cfg(feature = "defmt-03")]
        defmt::trace!("Waiting for GDO0 to go {}", if high { "high" } else { "low" });

        let gdo0 = &mut self.gdo0;
        poll_until(self.bus.spin(), high, || {
            gdo0.is_high().map_err(|e| DeviceError::pin(Line::Done, e))
        })?
        .ready_or_timeout(Line::Done)
    }
}
