//! The ordered interval container.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::{Bound, RangeBounds};

use super::Tick;
use super::entry::{ChannelValue, Entry};

/// An interval-keyed timeline: an ordered map from [`Tick`] to [`Entry`].
///
/// Keys are unique and iterate in ascending order; inserting at an occupied
/// key overwrites. Each key marks the boundary between the interval ending
/// there and the one starting there, which is what the `before`/`after`
/// projections of [`Entry`] refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalTimeline<T> {
    map: BTreeMap<Tick, Entry<T>>,
}

impl<T> Default for IntervalTimeline<T> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<T> IntervalTimeline<T> {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the timeline holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts an entry at `at`, overwriting any existing one.
    pub fn insert(&mut self, at: Tick, entry: impl Into<Entry<T>>) {
        self.map.insert(at, entry.into());
    }

    /// Removes the entry at `at`, returning it if present.
    pub fn remove(&mut self, at: Tick) -> Option<Entry<T>> {
        self.map.remove(&at)
    }

    /// Removes every entry whose key lies in `range`.
    pub fn remove_range<R: RangeBounds<Tick>>(&mut self, range: R) {
        let keys: Vec<Tick> = self.map.range(range).map(|(&key, _)| key).collect();
        for key in keys {
            self.map.remove(&key);
        }
    }

    /// Moves every entry of `other` into `self`, overwriting on key
    /// collision.
    pub fn merge(&mut self, other: Self) {
        self.map.extend(other.map);
    }

    /// Whether `at` is an occupied key.
    #[must_use]
    pub fn contains_key(&self, at: Tick) -> bool {
        self.map.contains_key(&at)
    }

    /// The entry at `at`, if any.
    #[must_use]
    pub fn get(&self, at: Tick) -> Option<&Entry<T>> {
        self.map.get(&at)
    }

    /// Mutable access to the entry at `at`, if any.
    pub fn get_mut(&mut self, at: Tick) -> Option<&mut Entry<T>> {
        self.map.get_mut(&at)
    }

    /// Value of the interval ending at `at`, if `at` is a key.
    #[must_use]
    pub fn before_at(&self, at: Tick) -> Option<&T> {
        self.get(at).map(Entry::before)
    }

    /// Value of the interval starting at `at`, if `at` is a key.
    #[must_use]
    pub fn after_at(&self, at: Tick) -> Option<&T> {
        self.get(at).map(Entry::after)
    }

    /// The entry at the greatest key not after `at`.
    #[must_use]
    pub fn prev(&self, at: Tick) -> Option<(Tick, &Entry<T>)> {
        self.map
            .range(..=at)
            .next_back()
            .map(|(&key, entry)| (key, entry))
    }

    /// The entry at the smallest key strictly after `at`.
    #[must_use]
    pub fn next(&self, at: Tick) -> Option<(Tick, &Entry<T>)> {
        self.map
            .range((Bound::Excluded(at), Bound::Unbounded))
            .next()
            .map(|(&key, entry)| (key, entry))
    }

    /// The entry at the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(Tick, &Entry<T>)> {
        self.map.iter().next().map(|(&key, entry)| (key, entry))
    }

    /// The entry at the greatest key.
    #[must_use]
    pub fn last(&self) -> Option<(Tick, &Entry<T>)> {
        self.map
            .iter()
            .next_back()
            .map(|(&key, entry)| (key, entry))
    }

    /// Iterates entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, Tick, Entry<T>> {
        self.map.iter()
    }
}

impl<T: PartialEq> IntervalTimeline<T> {
    /// Inserts a `before`/`after` pair at `at`, collapsing equal halves to a
    /// single value.
    pub fn insert_jump(&mut self, at: Tick, before: T, after: T) {
        self.map.insert(at, Entry::jump(before, after));
    }
}

impl<T: Clone> IntervalTimeline<T> {
    /// Entries relevant to the span `[start, end]`: everything inside it,
    /// plus the entry in force at `start` (the greatest key not after
    /// `start`, or the first entry when none precedes it) and the first
    /// entry at or past `end`.
    #[must_use]
    pub fn surrounding(&self, start: Tick, end: Tick) -> Self {
        if end < start {
            return Self::new();
        }
        let lo = match self.prev(start) {
            Some((key, _)) => Bound::Included(key),
            None => Bound::Included(start),
        };
        let hi = match self.map.range(end..).next() {
            Some((&key, _)) => Bound::Included(key),
            None => Bound::Unbounded,
        };
        Self {
            map: self
                .map
                .range((lo, hi))
                .map(|(&key, entry)| (key, entry.clone()))
                .collect(),
        }
    }

    /// Entries with keys inside `[start, end]`.
    #[must_use]
    pub fn inner(&self, start: Tick, end: Tick) -> Self {
        if end < start {
            return Self::new();
        }
        Self {
            map: self
                .map
                .range(start..=end)
                .map(|(&key, entry)| (key, entry.clone()))
                .collect(),
        }
    }

    /// A copy with every key shifted by `delta`.
    #[must_use]
    pub fn offset(&self, delta: Tick) -> Self {
        Self {
            map: self
                .map
                .iter()
                .map(|(&key, entry)| (key + delta, entry.clone()))
                .collect(),
        }
    }
}

impl<T: ChannelValue> IntervalTimeline<T> {
    /// Interpolated numeric value at `at`.
    ///
    /// Before the first key the first entry's `before` value applies, after
    /// the last key the last entry's `after` value applies, and at an exact
    /// key the entry's `after` value applies. Between two keys the previous
    /// entry's `after` and the next entry's `before` are linearly
    /// interpolated. Values with no numeric reading count as NaN; an
    /// interpolation with one NaN endpoint yields the other endpoint, and an
    /// empty timeline yields NaN.
    #[must_use]
    pub fn interpolate(&self, at: Tick) -> f64 {
        self.interpolate_or(at, f64::NAN)
    }

    /// Like [`Self::interpolate`], with `fallback` substituted for values
    /// that have no numeric reading before any NaN handling applies.
    #[must_use]
    pub fn interpolate_or(&self, at: Tick, fallback: f64) -> f64 {
        let prev = self.prev(at);
        let next = self.next(at);
        interpolate_between(prev, next, at, fallback)
    }

    /// Batched [`Self::interpolate`] over ascending query points.
    #[must_use]
    pub fn interpolate_many(&self, points: &[Tick]) -> Vec<f64> {
        self.interpolate_many_or(points, f64::NAN)
    }

    /// Batched [`Self::interpolate_or`] over ascending query points.
    ///
    /// A single forward sweep over the timeline; per-point results are
    /// identical to the one-shot variant.
    #[must_use]
    pub fn interpolate_many_or(&self, points: &[Tick], fallback: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(points.len());
        let mut entries = self.map.iter().peekable();
        let mut prev: Option<(Tick, &Entry<T>)> = None;
        for &at in points {
            while let Some(&(&key, entry)) = entries.peek() {
                if key > at {
                    break;
                }
                prev = Some((key, entry));
                entries.next();
            }
            let next = entries.peek().map(|&(&key, entry)| (key, entry));
            out.push(interpolate_between(prev, next, at, fallback));
        }
        out
    }
}

impl<T: ChannelValue + Clone + PartialEq> IntervalTimeline<T> {
    /// Entries inside `[start, end]`, with interpolated entries synthesized
    /// at the boundaries when the timeline extends past them.
    ///
    /// The result carries no information from outside the span but still
    /// evaluates to the same values across it.
    #[must_use]
    pub fn clamp(&self, start: Tick, end: Tick) -> Self {
        if end < start {
            return Self::new();
        }
        let mut clamped = self.inner(start, end);
        if self.first().is_some_and(|(key, _)| key < start) && !self.contains_key(start) {
            clamped.insert(start, T::from_f64(self.interpolate(start)));
        }
        if self.last().is_some_and(|(key, _)| key > end) && !self.contains_key(end) {
            clamped.insert(end, T::from_f64(self.interpolate(end)));
        }
        clamped
    }
}

fn interpolate_between<T: ChannelValue>(
    prev: Option<(Tick, &Entry<T>)>,
    next: Option<(Tick, &Entry<T>)>,
    at: Tick,
    fallback: f64,
) -> f64 {
    let project = |value: &T| value.as_f64().unwrap_or(fallback);
    match (prev, next) {
        (None, None) => f64::NAN,
        (None, Some((_, entry))) => project(entry.before()),
        (Some((key, entry)), _) if key == at => project(entry.after()),
        (Some((_, entry)), None) => project(entry.after()),
        (Some((prev_key, prev_entry)), Some((next_key, next_entry))) => {
            let y1 = project(prev_entry.after());
            let y2 = project(next_entry.before());
            if y1.is_nan() {
                y2
            } else if y2.is_nan() {
                y1
            } else {
                lerp(prev_key, y1, next_key, y2, at)
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn lerp(x1: Tick, y1: f64, x2: Tick, y2: f64, x: Tick) -> f64 {
    let ratio = (x.0 - x1.0) as f64 / (x2.0 - x1.0) as f64;
    y1 * (1.0 - ratio) + y2 * ratio
}

impl<T> FromIterator<(Tick, Entry<T>)> for IntervalTimeline<T> {
    fn from_iter<I: IntoIterator<Item = (Tick, Entry<T>)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<(Tick, Entry<T>)> for IntervalTimeline<T> {
    fn extend<I: IntoIterator<Item = (Tick, Entry<T>)>>(&mut self, iter: I) {
        self.map.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a IntervalTimeline<T> {
    type Item = (&'a Tick, &'a Entry<T>);
    type IntoIter = btree_map::Iter<'a, Tick, Entry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<T> IntoIterator for IntervalTimeline<T> {
    type Item = (Tick, Entry<T>);
    type IntoIter = btree_map::IntoIter<Tick, Entry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<T: std::fmt::Display> std::fmt::Display for IntervalTimeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, entry) in &self.map {
            match entry {
                Entry::Single(value) => writeln!(f, "{key} : {value}")?,
                Entry::Jump { before, after } => writeln!(f, "{key} : {before}, {after}")?,
            }
        }
        Ok(())
    }
}
