use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::{
    ll::{Bus, Device, PATABLE},
    poll::Spin,
    profile::{self, Band},
    Cc1101, Error,
};

use super::{Addressable, Idle, Ready};

#[allow(private_bounds)]
impl<State, Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<State, Sck, Mosi, Miso, Csn, Gdo, Delay>
where
    State: Addressable,
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Gdo: InputPin,
    Delay: DelayNs,
{
    /// The typed register map and command strobes.
    ///
    /// The typestate only tracks what the driver itself did. A strobe or register write
    /// issued here can put the chip in a state the type no longer describes.
    pub fn ll(&mut self) -> Device<&mut Bus<Sck, Mosi, Miso, Csn, Delay>> {
        Device::new(&mut self.bus)
    }

    /// Raw register and FIFO access, with the same caveat as [Self::ll]
    pub fn bus(&mut self) -> &mut Bus<Sck, Mosi, Miso, Csn, Delay> {
        &mut self.bus
    }

    /// Reset the chip, dropping the whole configuration
    pub fn reset(mut self) -> Result<Cc1101<Idle, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        self.bus.idle_lines()?;
        self.bus.reset()?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Radio reset");

        Ok(self.cast_state(Idle))
    }

    /// Program the full register configuration for the band, followed by the PA table.
    ///
    /// Every register is written each time, so this can be repeated freely.
    pub fn configure(
        mut self,
        band: Band,
    ) -> Result<Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        self.apply_profile(Some(band))?;
        Ok(self.cast_state(Ready))
    }

    /// Like [Self::configure], but with the band given by its numeric selector.
    ///
    /// An unknown selector leaves the frequency registers untouched. The rest of the
    /// configuration is still written.
    pub fn configure_discriminant(
        mut self,
        discriminant: u8,
    ) -> Result<Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        let band = Band::try_from(discriminant).ok();

        if band.is_none() {
            #[cfg(feature = "defmt-03")]
            defmt::warn!(
                "Unknown band {=u8}, frequency registers are left as they are",
                discriminant
            );
        }

        self.apply_profile(band)?;
        Ok(self.cast_state(Ready))
    }

    fn apply_profile(&mut self, band: Option<Band>) -> Result<(), Error> {
        for (register, value) in profile::entries(band) {
            self.bus.write_register(register.into(), value)?;
        }

        self.bus.write_burst(PATABLE, &self.pa_table)?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Chip configured for {}", band);

        Ok(())
    }

    /// Read the part number and version of the chip
    pub fn chip_info(&mut self) -> Result<ChipInfo, Error> {
        let partnum = self.ll().partnum().read()?.value();
        let version = self.ll().version().read()?.value();

        Ok(ChipInfo { partnum, version })
    }

    /// The current state of the main radio control state machine
    pub fn marc_state(&mut self) -> Result<MarcState, Error> {
        let state = self.ll().marcstate().read()?.marc_state();
        Ok(MarcState::from_primitive(state))
    }

    /// Number of bytes waiting in the TX FIFO
    pub fn tx_fifo_bytes(&mut self) -> Result<u8, Error> {
        Ok(self.ll().txbytes().read()?.num_txbytes())
    }

    /// Number of bytes waiting in the RX FIFO
    pub fn rx_fifo_bytes(&mut self) -> Result<u8, Error> {
        Ok(self.ll().rxbytes().read()?.num_rxbytes())
    }

    /// Change how long the driver is allowed to wait on the chip
    pub fn set_spin(&mut self, spin: Spin) {
        self.bus.set_spin(spin);
    }
}

/// Identification of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ChipInfo {
    /// Always 0x00 for this part
    pub partnum: u8,
    pub version: u8,
}

/// State of the main radio control state machine, as reported by MARCSTATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum MarcState {
    Sleep = 0,
    Idle = 1,
    Xoff = 2,
    VcoonMc = 3,
    RegonMc = 4,
    Mancal = 5,
    Vcoon = 6,
    Regon = 7,
    Startcal = 8,
    Bwboost = 9,
    FsLock = 10,
    Ifadcon = 11,
    Endcal = 12,
    Rx = 13,
    RxEnd = 14,
    RxRst = 15,
    TxrxSwitch = 16,
    RxfifoOverflow = 17,
    Fstxon = 18,
    Tx = 19,
    TxEnd = 20,
    RxtxSwitch = 21,
    TxfifoUnderflow = 22,
    #[num_enum(catch_all)]
    Unknown(u8),
}
