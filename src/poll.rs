//! Busy-wait polling of hardware-sensed lines

/// How long a busy-wait may spin before giving up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Spin {
    /// Spin until the line reaches the wanted level, however long that takes.
    ///
    /// This is what the chip's contract asks for: after a valid command it always
    /// eventually signals ready/done. A dead or miswired chip hangs the caller.
    #[default]
    Forever,
    /// Give up after this many polls of the line (at least one poll is always done)
    Bounded(u32),
}

/// The result of a busy-wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PollOutcome {
    /// The line reached the wanted level
    Ready,
    /// The poll bound ran out first
    TimedOut,
}

/// Poll `sense` until it reports `level` or the spin bound runs out.
///
/// Errors from `sense` end the wait immediately.
pub fn poll_until<E>(
    spin: Spin,
    level: bool,
    mut sense: impl FnMut() -> Result<bool, E>,
) -> Result<PollOutcome, E> {
    let mut polls: u32 = 0;

    loop {
        if sense()? == level {
            return Ok(PollOutcome::Ready);
        }

        polls = polls.saturating_add(1);
        if let Spin::Bounded(max) = spin {
            if polls >= max {
                return Ok(PollOutcome::TimedOut);
            }
        }

        core::hint::spin_loop();
    }
}
