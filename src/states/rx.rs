use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    ll::FIFO,
    packet::{PacketStatus, RxResult, MAX_PAYLOAD_LEN, STATUS_LEN},
    Cc1101, Error,
};

use super::{Ready, Rx};

impl<Sck, Mosi, Miso, Csn, Gdo, Delay> Cc1101<Rx, Sck, Mosi, Miso, Csn, Gdo, Delay>
where
    Sck: OutputPin,
    Mosi: OutputPin,
    Miso: InputPin,
    Csn: OutputPin,
    Gdo: InputPin,
    Delay: DelayNs,
{
    /// Check if a packet came in.
    ///
    /// When GDO0 is high a packet is being received, and this blocks until it's done and
    /// returns true. Otherwise it returns false right away.
    pub fn check_receive_flag(&mut self) -> Result<bool, Error> {
        if !self.done_line()? {
            return Ok(false);
        }

        self.wait_done_line(false)?;
        Ok(true)
    }

    /// Read the received packet out of the RX FIFO into `buffer`.
    ///
    /// The RX FIFO is flushed afterwards, whatever was (or wasn't) in it.
    pub fn receive_data(&mut self, buffer: &mut [u8]) -> Result<RxResult, Error> {
        let result = self.read_packet(buffer);
        let flushed = self.ll().sfrx().dispatch();

        let result = result?;
        flushed?;

        if !matches!(result, RxResult::Empty) {
            self.state.rx_done = true;
        }

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Received: {}", result);

        Ok(result)
    }

    fn read_packet(&mut self, buffer: &mut [u8]) -> Result<RxResult, Error> {
        if self.ll().rxbytes().read()?.num_rxbytes() == 0 {
            return Ok(RxResult::Empty);
        }

        let packet_size = self.bus.read_register(FIFO)? as usize;

        if packet_size > buffer.len().min(MAX_PAYLOAD_LEN) {
            #[cfg(feature = "defmt-03")]
            defmt::warn!(
                "Received length {} doesn't fit a buffer of {}",
                packet_size,
                buffer.len()
            );

            return Ok(RxResult::TooBigForBuffer { packet_size });
        }

        self.bus.read_burst(FIFO, &mut buffer[..packet_size])?;

        let mut status = [0; STATUS_LEN];
        self.bus.read_burst(FIFO, &mut status)?;

        Ok(RxResult::Ok {
            packet_size,
            status: PacketStatus::from_bytes(status),
        })
    }

    /// Stop receiving and flush whatever is in the RX FIFO
    pub fn abort(mut self) -> Result<Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>, Error> {
        self.ll().sidle().dispatch()?;
        self.ll().sfrx().dispatch()?;

        Ok(self.cast_state(Ready))
    }

    /// Hand the radio back as [Ready] once [Self::receive_data] has read out a packet. The
    /// chip drops to IDLE at the end of a packet, so no strobe is needed.
    ///
    /// While the receiver is still on, `self` is returned untouched. Use [Self::abort] to
    /// turn it off.
    pub fn finish(self) -> Result<Cc1101<Ready, Sck, Mosi, Miso, Csn, Gdo, Delay>, Self> {
        if self.state.rx_done {
            Ok(self.cast_state(Ready))
        } else {
            Err(self)
        }
    }
}
