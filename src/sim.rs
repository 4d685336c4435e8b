//! A simulated transceiver behind the pin traits, for tests.
//!
//! The model speaks the chip's side of the bit-banged protocol: it shifts in data-out on
//! rising clock edges while chip-select is low, drives data-in (doubling as the ready line),
//! applies register, FIFO and PA table accesses and executes strobes. GDO0 follows a script
//! that is loaded when the transmitter or receiver is turned on.

use core::{
    cell::{RefCell, RefMut},
    convert::Infallible,
};
use std::{collections::VecDeque, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::{
    bitbang::{BitBang, BitTiming},
    ll::{Bus, Line, ADDRESS_MASK, BURST, FIFO, PATABLE, READ, SRES},
    poll::Spin,
    states::PowerUp,
    Cc1101,
};

/// Power-on values of the configuration registers 0x00..=0x2E
const RESET_REGISTERS: [u8; 0x2F] = [
    0x29, 0x2E, 0x3F, 0x07, 0xD3, 0x91, 0xFF, 0x04, 0x45, 0x00, 0x00, 0x0F, 0x00, 0x1E, 0xC4, 0xEC,
    0x8C, 0x22, 0x02, 0x22, 0xF8, 0x47, 0x07, 0x30, 0x04, 0x36, 0x6C, 0x03, 0x40, 0x91, 0x87, 0x6B,
    0xF8, 0x56, 0x10, 0xA9, 0x0A, 0x20, 0x0D, 0x41, 0x00, 0x59, 0x7F, 0x3F, 0x88, 0x31, 0x0B,
];
const RESET_PA_TABLE: [u8; 8] = [0xC6, 0, 0, 0, 0, 0, 0, 0];

const SRX: u8 = 0x34;
const STX: u8 = 0x35;
const SIDLE: u8 = 0x36;
const SFRX: u8 = 0x3A;
const SFTX: u8 = 0x3B;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Select,
    Deselect,
    Byte { mosi: u8, miso: u8 },
    Strobe(u8),
    DelayNs(u32),
    /// A clock edge arrived while the chip had the ready line high
    ClockedWhileBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Rx,
    Tx,
}

impl Mode {
    fn marc_state(self) -> u8 {
        match self {
            Mode::Idle => 1,
            Mode::Rx => 13,
            Mode::Tx => 19,
        }
    }

    fn status_bits(self) -> u8 {
        match self {
            Mode::Idle => 0,
            Mode::Rx => 1,
            Mode::Tx => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Register(u8),
    Status(u8),
    PaTable,
    Fifo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Strobe,
    Access {
        target: Target,
        read: bool,
        burst: bool,
    },
}

pub struct Chip {
    registers: [u8; 0x2F],
    pa_table: [u8; 8],
    pa_index: usize,
    tx_fifo: Vec<u8>,
    rx_fifo: VecDeque<u8>,
    version: u8,
    mode: Mode,

    cs_low: bool,
    sck_high: bool,
    mosi_high: bool,
    shift_in: u8,
    bits: u8,
    out: Option<u8>,
    frame: Option<Frame>,

    busy: u32,
    busy_after_reset: u32,
    busy_polls: u32,

    gdo_level: bool,
    gdo_script: VecDeque<bool>,
    tx_script: Vec<bool>,
    rx_script: Vec<bool>,

    sent: Vec<Vec<u8>>,
    log: Vec<Event>,
}

impl Chip {
    fn new() -> Self {
        Self {
            registers: RESET_REGISTERS,
            pa_table: RESET_PA_TABLE,
            pa_index: 0,
            tx_fifo: Vec::new(),
            rx_fifo: VecDeque::new(),
            version: 0x04,
            mode: Mode::Idle,
            cs_low: false,
            sck_high: true,
            mosi_high: false,
            shift_in: 0,
            bits: 0,
            out: None,
            frame: None,
            busy: 0,
            busy_after_reset: 0,
            busy_polls: 0,
            gdo_level: false,
            gdo_script: VecDeque::new(),
            // Sync word out, end of packet
            tx_script: vec![false, true, true, false],
            rx_script: Vec::new(),
            sent: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Hold the ready line high for this many polls
    pub fn set_busy(&mut self, polls: u32) {
        self.busy = polls;
    }

    /// Ready line polls the chip stays busy after a reset strobe
    pub fn set_busy_after_reset(&mut self, polls: u32) {
        self.busy_after_reset = polls;
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub fn busy_polls(&self) -> u32 {
        self.busy_polls
    }

    pub fn log(&self) -> &[Event] {
        &self.log
    }

    pub fn strobes(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|event| match event {
                Event::Strobe(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    /// The data-out bytes of every chip-select window that clocked at least one byte
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current = Vec::new();

        for event in &self.log {
            match event {
                Event::Select => current.clear(),
                Event::Byte { mosi, .. } => current.push(*mosi),
                Event::Deselect if !current.is_empty() => {
                    frames.push(core::mem::take(&mut current))
                }
                _ => {}
            }
        }

        frames
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    pub fn pa_table(&self) -> [u8; 8] {
        self.pa_table
    }

    pub fn tx_fifo(&self) -> &[u8] {
        &self.tx_fifo
    }

    pub fn rx_fifo_len(&self) -> usize {
        self.rx_fifo.len()
    }

    /// Everything the TX FIFO held at each transmit strobe
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.clone()
    }

    /// Move the TX FIFO contents into the RX FIFO
    pub fn loopback(&mut self) {
        self.rx_fifo.extend(self.tx_fifo.drain(..));
    }

    /// Put a packet with its status bytes in the RX FIFO and raise/lower GDO0 for it
    pub fn load_rx_packet(&mut self, payload: &[u8], status: [u8; 2]) {
        self.rx_fifo.push_back(payload.len() as u8);
        self.rx_fifo.extend(payload.iter().copied());
        self.rx_fifo.extend(status);
        self.load_script(&[true, true, false]);
    }

    /// GDO0 levels after the transmit strobe, one per read
    pub fn set_tx_done_script(&mut self, script: &[bool]) {
        self.tx_script = script.to_vec();
        if self.mode == Mode::Tx {
            self.load_script(script);
        }
    }

    /// GDO0 levels after the receive strobe, one per read
    pub fn set_rx_done_script(&mut self, script: &[bool]) {
        self.rx_script = script.to_vec();
        if self.mode == Mode::Rx {
            self.load_script(script);
        }
    }

    pub fn done_script_finished(&self) -> bool {
        self.gdo_script.is_empty()
    }

    fn load_script(&mut self, script: &[bool]) {
        self.gdo_script = script.iter().copied().collect();
        self.gdo_level = false;
    }

    fn set_cs(&mut self, high: bool) {
        match (self.cs_low, high) {
            (false, false) => {
                self.cs_low = true;
                self.shift_in = 0;
                self.bits = 0;
                self.out = None;
                self.frame = None;
                self.pa_index = 0;
                self.log.push(Event::Select);
            }
            (true, true) => {
                self.cs_low = false;
                self.frame = None;
                self.log.push(Event::Deselect);
            }
            _ => {}
        }
    }

    fn set_sck(&mut self, high: bool) {
        let rising = high && !self.sck_high;
        self.sck_high = high;

        if !rising || !self.cs_low {
            return;
        }

        if self.busy > 0 {
            self.log.push(Event::ClockedWhileBusy);
        }

        self.shift_in = self.shift_in << 1 | self.mosi_high as u8;
        self.bits += 1;

        if self.bits == 8 {
            let mosi = self.shift_in;
            let miso = self.out.take().unwrap_or(0xFF);
            self.bits = 0;
            self.shift_in = 0;

            self.log.push(Event::Byte { mosi, miso });
            match self.frame {
                None => self.header(mosi),
                Some(frame) => self.data(frame, mosi),
            }
        }
    }

    fn data_in(&mut self) -> bool {
        if !self.cs_low {
            return true;
        }

        if self.bits == 0 && self.out.is_none() && self.busy > 0 {
            self.busy -= 1;
            self.busy_polls += 1;
            return true;
        }

        let out = match self.out {
            Some(out) => out,
            None => {
                let out = self.next_out();
                self.out = Some(out);
                out
            }
        };

        out >> (7 - self.bits) & 1 == 1
    }

    fn gdo0(&mut self) -> bool {
        if let Some(level) = self.gdo_script.pop_front() {
            self.gdo_level = level;

            // The radio drops back to idle at the end of the packet
            if self.gdo_script.is_empty() && !level {
                self.mode = Mode::Idle;
            }
        }

        self.gdo_level
    }

    fn status_byte(&self) -> u8 {
        let available = match self.mode {
            Mode::Rx => self.rx_fifo.len(),
            _ => self.tx_fifo.len(),
        };

        self.mode.status_bits() << 4 | available.min(15) as u8
    }

    fn status_register(&self, address: u8) -> u8 {
        match address {
            0x30 => 0x00,
            0x31 => self.version,
            0x33 => 0x80,
            0x35 => self.mode.marc_state(),
            0x38 => self.gdo_level as u8,
            0x3A => self.tx_fifo.len().min(0x7F) as u8,
            0x3B => self.rx_fifo.len().min(0x7F) as u8,
            _ => 0x00,
        }
    }

    fn next_out(&mut self) -> u8 {
        match self.frame {
            Some(Frame::Access {
                target,
                read: true,
                ..
            }) => match target {
                Target::Register(address) => self
                    .registers
                    .get(address as usize)
                    .copied()
                    .unwrap_or(0),
                Target::Status(address) => self.status_register(address),
                Target::PaTable => self.pa_table[self.pa_index % 8],
                Target::Fifo => self.rx_fifo.pop_front().unwrap_or(0),
            },
            _ => self.status_byte(),
        }
    }

    fn header(&mut self, header: u8) {
        let address = header & ADDRESS_MASK;
        let read = header & READ != 0;
        let burst = header & BURST != 0;

        let target = match address {
            0x30..=0x3D if read && burst => Target::Status(address),
            0x30..=0x3D => {
                self.frame = Some(Frame::Strobe);
                self.strobe(address);
                return;
            }
            PATABLE => Target::PaTable,
            FIFO => Target::Fifo,
            address => Target::Register(address),
        };

        self.frame = Some(Frame::Access {
            target,
            read,
            burst,
        });
    }

    fn data(&mut self, frame: Frame, mosi: u8) {
        let Frame::Access {
            target,
            read,
            burst,
        } = frame
        else {
            return;
        };

        match target {
            Target::Register(address) => {
                if !read {
                    if let Some(register) = self.registers.get_mut(address as usize) {
                        *register = mosi;
                    }
                }
                if burst {
                    self.frame = Some(Frame::Access {
                        target: Target::Register(address + 1),
                        read,
                        burst,
                    });
                }
            }
            Target::PaTable => {
                if !read {
                    self.pa_table[self.pa_index % 8] = mosi;
                }
                self.pa_index += 1;
            }
            Target::Fifo => {
                if !read {
                    self.tx_fifo.push(mosi);
                }
            }
            Target::Status(_) => {}
        }
    }

    fn strobe(&mut self, command: u8) {
        self.log.push(Event::Strobe(command));

        match command {
            SRES => {
                self.registers = RESET_REGISTERS;
                self.pa_table = RESET_PA_TABLE;
                self.tx_fifo.clear();
                self.rx_fifo.clear();
                self.mode = Mode::Idle;
                self.gdo_script.clear();
                self.gdo_level = false;
                self.busy = self.busy_after_reset;
            }
            SRX => {
                self.mode = Mode::Rx;
                let script = self.rx_script.clone();
                self.load_script(&script);
            }
            STX => {
                self.mode = Mode::Tx;
                self.sent.push(self.tx_fifo.clone());
                let script = self.tx_script.clone();
                self.load_script(&script);
            }
            SIDLE => {
                self.mode = Mode::Idle;
                self.gdo_script.clear();
                self.gdo_level = false;
            }
            SFRX => self.rx_fifo.clear(),
            SFTX => self.tx_fifo.clear(),
            _ => {}
        }
    }
}

/// A handle on a shared simulated chip
#[derive(Clone)]
pub struct Sim {
    chip: Rc<RefCell<Chip>>,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            chip: Rc::new(RefCell::new(Chip::new())),
        }
    }

    /// Don't hold on to this while the bus is in use
    pub fn chip(&self) -> RefMut<'_, Chip> {
        self.chip.borrow_mut()
    }

    pub fn pin(&self, line: Line) -> SimPin {
        SimPin {
            chip: self.chip.clone(),
            line,
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            chip: self.chip.clone(),
        }
    }

    pub fn bus(&self) -> Bus<SimPin, SimPin, SimPin, SimPin, SimDelay> {
        Bus::new(
            BitBang::new(
                self.pin(Line::Clock),
                self.pin(Line::DataOut),
                self.pin(Line::DataIn),
                self.delay(),
                BitTiming::default(),
            ),
            self.pin(Line::ChipSelect),
            Spin::Forever,
        )
    }

    pub fn radio(&self) -> Cc1101<PowerUp, SimPin, SimPin, SimPin, SimPin, SimPin, SimDelay> {
        Cc1101::new(
            self.pin(Line::Clock),
            self.pin(Line::DataOut),
            self.pin(Line::DataIn),
            self.pin(Line::ChipSelect),
            self.pin(Line::Done),
            self.delay(),
        )
    }
}

pub struct SimPin {
    chip: Rc<RefCell<Chip>>,
    line: Line,
}

impl SimPin {
    fn drive(&mut self, high: bool) {
        let mut chip = self.chip.borrow_mut();

        match self.line {
            Line::Clock => chip.set_sck(high),
            Line::DataOut => chip.mosi_high = high,
            Line::ChipSelect => chip.set_cs(high),
            Line::DataIn | Line::Done => panic!("{:?} is an input", self.line),
        }
    }

    fn sense(&mut self) -> bool {
        let mut chip = self.chip.borrow_mut();

        match self.line {
            Line::DataIn => chip.data_in(),
            Line::Done => chip.gdo0(),
            line => panic!("{line:?} is an output"),
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.sense())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.sense())
    }
}

pub struct SimDelay {
    chip: Rc<RefCell<Chip>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.chip.borrow_mut().log.push(Event::DelayNs(ns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_register_and_strobe_share_an_address() {
        let sim = Sim::new();
        let mut bus = sim.bus();

        sim.chip().load_rx_packet(&[1, 2], [0, 0]);
        bus.write_burst(FIFO, &[7, 8, 9]).unwrap();

        // TXBYTES and RXBYTES sit at the addresses of SFRX and SFTX
        assert_eq!(bus.read_status(SFRX).unwrap(), 3);
        assert_eq!(bus.read_status(SFTX).unwrap(), 5);
        assert!(sim.chip().strobes().is_empty());

        bus.strobe(SFRX).unwrap();
        assert_eq!(sim.chip().rx_fifo_len(), 0);
        assert_eq!(sim.chip().tx_fifo(), [7, 8, 9]);
        assert_eq!(sim.chip().strobes(), [SFRX]);
    }

    #[test]
    fn strobe_returns_the_status_byte() {
        let sim = Sim::new();
        let mut bus = sim.bus();

        bus.write_burst(FIFO, &[0; 20]).unwrap();
        // Idle, FIFO count saturates at 15
        assert_eq!(bus.strobe(0x3D).unwrap(), 0x0F);

        bus.strobe(SRX).unwrap();
        assert_eq!(bus.strobe(0x3D).unwrap(), 0x10);
    }
}
