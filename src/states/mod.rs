pub mod addressable;
pub mod power_up;
pub mod ready;
pub mod rx;

/// Freshly powered. The lines haven't been set up and the chip hasn't been reset.
pub struct PowerUp;
/// Reset, registers at their defaults
pub struct Idle;
/// Configured and idle, ready to send or start receiving
pub struct Ready;
/// The receiver is on
pub struct Rx {
    rx_done: bool,
}

impl Rx {
    pub(crate) fn new() -> Self {
        Self { rx_done: false }
    }
}

/// Implemented if the state allows for bus communication
pub(crate) trait Addressable {}

impl Addressable for Idle {}
impl Addressable for Ready {}
impl Addressable for Rx {}
