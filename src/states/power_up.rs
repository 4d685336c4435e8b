use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    bitbang::{BitBang, BitTiming},
    ll::Bus,
    poll::Spin,
    profile::{Band, DEFAULT_PA_TABLE},
    Cc1101, Error,
};

use super::{Idle, PowerUp, Ready};

/// Everything [Cc1101::init] needs to bring the radio up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    pub band: Band,
    /// Power amplifier table, written after the registers
    pub pa_table: [u8; 8],
    pub timing: BitTiming,
    /// Bound on every busy-wait of the driver
    pub spin: Spin,
    /// Time the chip gets to start its crystal before the reset sequence
    pub power_up_delay_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            band: Band::Mhz433,
            pa_table: DEFAULT_PA_TABLE,
            timing: BitTiming::default(),
            spin: Spin::Forever,
            power_up_delay_us: 1_000,
        }
    }
}

impl<Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<PowerUp, Sck, Mosi, Miso, Csn, Gdo, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Gdo: InputPin,
    Delay: DelayNs,
{
    pub fn new(sck: Sck, mosi: Mosi, miso: Miso, csn: Csn, gdo0: Gdo, delay: Delay) -> Self {
        Self {
            bus: Bus::new(
                BitBang::new(sck, mosi, miso, delay, BitTiming::default()),
                csn,
                Spin::Forever,
            ),
            gdo0,
            pa_table: DEFAULT_PA_TABLE,
            state: PowerUp,
        }
    }

    /// Bring the radio up: set the bus lines to their idle levels, give the chip time to
    /// power up, reset it and program the configuration for `config.band`.
    pub fn init(
        mut self,
        config: &Config,
    ) -> Result<Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        self.bus.set_timing(config.timing);
        self.bus.set_spin(config.spin);
        self.pa_table = config.pa_table;

        self.bus.idle_lines()?;
        self.bus.delay_us(config.power_up_delay_us);

        let radio = self.reset()?;
        let radio = radio.configure(config.band)?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Init done!");

        Ok(radio)
    }

    /// Run the reset sequence. This has to happen before any register access.
    pub fn reset(mut self) -> Result<Cc1101<Idle, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        #[cfg(feature = "defmt-03")]
        defmt::debug!("Resetting the radio");

        self.bus.idle_lines()?;
        self.bus.reset()?;

        Ok(self.cast_state(Idle))
    }
}
