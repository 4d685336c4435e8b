//! A tenth-of-a-second software clock driven from a periodic timer interrupt.
//!
//! The clock is meant to live in a `static` and has a single mutation point, [SoftClock::tick].
//! Everything else only reads it through [SoftClock::snapshot].
//!
//! ```
//! use cc1101_bitbang::clock::SoftClock;
//!
//! static CLOCK: SoftClock = SoftClock::new();
//!
//! // In the timer interrupt, every 100 ms
//! CLOCK.tick();
//!
//! let payload = CLOCK.snapshot().to_payload(1);
//! assert_eq!(payload, [1, 1, 0, 0, 0, 0]);
//! ```

use portable_atomic::{AtomicU32, Ordering};

const TENTHS_PER_SECOND: u32 = 10;
const TENTHS_PER_MINUTE: u32 = 60 * TENTHS_PER_SECOND;
const TENTHS_PER_HOUR: u32 = 60 * TENTHS_PER_MINUTE;
const TENTHS_PER_DAY: u32 = 24 * TENTHS_PER_HOUR;

/// Length of the timestamp packet built by [ClockSnapshot::to_payload]
pub const TIMESTAMP_PAYLOAD_LEN: usize = 6;

/// Time of day in tenths of a second, wrapping at 24 hours
#[derive(Debug)]
pub struct SoftClock {
    tenths: AtomicU32,
}

impl SoftClock {
    /// A clock at 00:00:00.0
    pub const fn new() -> Self {
        Self {
            tenths: AtomicU32::new(0),
        }
    }

    /// Advance the clock by a tenth of a second
    pub fn tick(&self) {
        self.tenths
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |tenths| {
                Some((tenths + 1) % TENTHS_PER_DAY)
            })
            .ok();
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::from_tenths(self.tenths.load(Ordering::Relaxed))
    }
}

impl Default for SoftClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A consistent reading of a [SoftClock]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ClockSnapshot {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub tenths: u8,
}

impl ClockSnapshot {
    fn from_tenths(tenths: u32) -> Self {
        let tenths = tenths % TENTHS_PER_DAY;

        Self {
            hours: (tenths / TENTHS_PER_HOUR) as u8,
            minutes: (tenths % TENTHS_PER_HOUR / TENTHS_PER_MINUTE) as u8,
            seconds: (tenths % TENTHS_PER_MINUTE / TENTHS_PER_SECOND) as u8,
            tenths: (tenths % TENTHS_PER_SECOND) as u8,
        }
    }

    /// The timestamp packet: `[tag, tenths, seconds, minutes, hours, 0]`
    pub fn to_payload(self, tag: u8) -> [u8; TIMESTAMP_PAYLOAD_LEN] {
        [tag, self.tenths, self.seconds, self.minutes, self.hours, 0]
    }

    /// Parse a timestamp packet into its tag and time. Returns `None` if the packet is too
    /// short or carries an impossible time.
    pub fn from_payload(payload: &[u8]) -> Option<(u8, Self)> {
        let &[tag, tenths, seconds, minutes, hours, ..] = payload else {
            return None;
        };

        let snapshot = Self {
            hours,
            minutes,
            seconds,
            tenths,
        };

        (hours < 24 && minutes < 60 && seconds < 60 && tenths < 10).then_some((tag, snapshot))
    }
}
