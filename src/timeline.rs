//! Interval-keyed timelines, the storage primitive every chart channel is
//! built from.

pub mod entry;
pub mod interval;

pub use entry::{ChannelValue, Entry};
pub use interval::IntervalTimeline;

/// A position on the chart timeline, measured in ticks.
///
/// There are [`Tick::PER_BEAT`] ticks to a beat, so a 4/4 measure spans 192
/// ticks. The timeline core never interprets the value; only plugins that
/// take beat-denominated arguments care about the resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub i64);

impl Tick {
    /// Tick zero, the start of the chart.
    pub const ZERO: Self = Self(0);
    /// Ticks per beat.
    pub const PER_BEAT: i64 = 48;
}

impl From<i64> for Tick {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::ops::Add for Tick {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Tick {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Tick {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl std::ops::AddAssign for Tick {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Tick {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
