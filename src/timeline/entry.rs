//! The dual-valued slot stored at each timeline key.

/// A value slot at one tick of an [`super::IntervalTimeline`].
///
/// Most entries hold a single value that applies both to the interval ending
/// at the key and the interval starting there. A `Jump` holds a distinct
/// `before`/`after` pair, which is how instantaneous changes (a laser slam, a
/// camera snap) are represented without a second key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Entry<T> {
    /// One value on both sides of the key.
    Single(T),
    /// Distinct values for the interval ending here and the one starting here.
    Jump {
        /// Value of the interval that ends at this key.
        before: T,
        /// Value of the interval that starts at this key.
        after: T,
    },
}

impl<T> Entry<T> {
    /// Creates an entry holding one value on both sides.
    pub const fn single(value: T) -> Self {
        Self::Single(value)
    }

    /// Value seen approaching the key from earlier ticks.
    pub const fn before(&self) -> &T {
        match self {
            Self::Single(value) | Self::Jump { before: value, .. } => value,
        }
    }

    /// Value seen leaving the key toward later ticks.
    pub const fn after(&self) -> &T {
        match self {
            Self::Single(value) | Self::Jump { after: value, .. } => value,
        }
    }

    /// Whether the two sides differ.
    pub const fn is_jump(&self) -> bool {
        matches!(self, Self::Jump { .. })
    }

    /// Maps both sides through `f`, preserving the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Entry<U> {
        match self {
            Self::Single(value) => Entry::Single(f(value)),
            Self::Jump { before, after } => Entry::Jump {
                before: f(before),
                after: f(after),
            },
        }
    }
}

impl<T: PartialEq> Entry<T> {
    /// Creates an entry from a `before`/`after` pair, collapsing to
    /// [`Entry::Single`] when the two are equal.
    pub fn jump(before: T, after: T) -> Self {
        if before == after {
            Self::Single(after)
        } else {
            Self::Jump { before, after }
        }
    }
}

impl<T: Clone + PartialEq> Entry<T> {
    /// Replaces the `before` side, keeping the `after` side.
    pub fn set_before(&mut self, value: T) {
        let after = self.after().clone();
        *self = Self::jump(value, after);
    }

    /// Replaces the `after` side, keeping the `before` side.
    pub fn set_after(&mut self, value: T) {
        let before = self.before().clone();
        *self = Self::jump(before, value);
    }

    /// Collapses a jump to a single value, keeping the `before` side.
    pub fn make_uniform(&mut self) {
        if self.is_jump() {
            *self = Self::Single(self.before().clone());
        }
    }
}

impl<T> From<T> for Entry<T> {
    fn from(value: T) -> Self {
        Self::Single(value)
    }
}

/// Conversion between a channel's stored value type and the numeric domain
/// used by interpolation and clamped slicing.
pub trait ChannelValue {
    /// Projects the value onto a number, or `None` when it has no numeric
    /// reading.
    fn as_f64(&self) -> Option<f64>;
    /// Reconstructs a value from a number.
    fn from_f64(value: f64) -> Self;
}

impl ChannelValue for i64 {
    fn as_f64(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        Some(*self as f64)
    }

    fn from_f64(value: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        {
            value.round() as Self
        }
    }
}

impl ChannelValue for f64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl ChannelValue for String {
    fn as_f64(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn from_f64(value: f64) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn jump_collapses_when_equal() {
        assert_eq!(Entry::jump(3, 3), Entry::Single(3));
        assert_eq!(
            Entry::jump(3, 5),
            Entry::Jump {
                before: 3,
                after: 5
            }
        );
    }

    #[test]
    fn side_mutation_renormalizes() {
        let mut entry = Entry::jump(1.0, 2.0);
        entry.set_before(2.0);
        assert_eq!(entry, Entry::Single(2.0));
        entry.set_after(4.0);
        assert!(entry.is_jump());
        entry.make_uniform();
        assert_eq!(entry, Entry::Single(2.0));
    }

    #[test]
    fn string_channel_value_parses_numbers_only() {
        assert_eq!(" 1.5 ".to_string().as_f64(), Some(1.5));
        assert_eq!("2x".to_string().as_f64(), None);
        assert_eq!("NaN".to_string().as_f64(), None);
    }
}
