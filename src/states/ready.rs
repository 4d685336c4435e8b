use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    ll::{FIFO, PATABLE},
    packet::MAX_PAYLOAD_LEN,
    Cc1101, Error,
};

use super::{Ready, Rx};

impl<Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Gdo: InputPin,
    Delay: DelayNs,
{
    /// Send a packet and block until the chip is done transmitting it.
    ///
    /// The payload can be at most [MAX_PAYLOAD_LEN] bytes long. A longer payload is rejected
    /// before anything goes out on the bus.
    ///
    /// If the wait on GDO0 gives up, the radio is idled and the TX FIFO flushed before the
    /// timeout is returned.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::BufferTooLarge);
        }

        #[cfg(feature = "defmt-03")]
        defmt::trace!("Sending {=[u8]:X}", payload);

        self.bus.write_register(FIFO, payload.len() as u8)?;
        self.bus.write_burst(FIFO, payload)?;
        self.ll().stx().dispatch()?;

        // GDO0 goes high once the sync word is out and low at the end of the packet
        let done = self
            .wait_done_line(true)
            .and_then(|()| self.wait_done_line(false));

        if let Err(error) = done {
            // The TX FIFO can only be flushed from idle
            self.ll().sidle().dispatch()?;
            self.ll().sftx().dispatch()?;
            return Err(error.into());
        }

        self.ll().sftx().dispatch()?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Sent {} bytes", payload.len());

        Ok(())
    }

    /// Turn on the receiver. This doesn't wait for anything.
    pub fn set_receive(mut self) -> Result<Cc1101<Rx, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        self.ll().srx().dispatch()?;

        #[cfg(feature = "defmt-03")]
        defmt::trace!("Receiver on");

        Ok(self.cast_state(Rx::new()))
    }

    /// Select the channel, offset from the base frequency by the configured channel spacing
    pub fn set_channel(&mut self, channel: u8) -> Result<(), Error> {
        self.ll().channr().write(|reg| reg.set_value(channel))?;
        Ok(())
    }

    /// Set the address used for packet filtering.
    ///
    /// The default configuration doesn't check addresses, so this only has an effect when
    /// the address check in PKTCTRL1 is turned on through [Self::ll].
    pub fn set_device_address(&mut self, address: u8) -> Result<(), Error> {
        self.ll().addr().write(|reg| reg.set_value(address))?;
        Ok(())
    }

    /// Replace the power amplifier table. It's also kept for later calls to `configure`.
    pub fn set_pa_table(&mut self, pa_table: [u8; 8]) -> Result<(), Error> {
        self.pa_table = pa_table;
        self.bus.write_burst(PATABLE, &pa_table)?;
        Ok(())
    }
}
