//! The aggregate chart: one [`IntervalTimeline`] per KSH channel.

use crate::timeline::{IntervalTimeline, Tick};

/// BT (button) note lanes, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BtLane {
    /// Leftmost lane.
    A,
    /// Second lane.
    B,
    /// Third lane.
    C,
    /// Rightmost lane.
    D,
}

impl BtLane {
    /// All lanes in channel order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

/// The side of an FX lane, a laser knob, or a sided mark channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// The left lane or knob.
    Left,
    /// The right lane or knob.
    Right,
}

impl Side {
    /// Both sides in channel order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// A mark channel: string-valued chart state that is keyed on the timeline
/// alongside notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mark {
    /// Tempo in beats per minute.
    Bpm,
    /// Time signature, `n/d`.
    TimeSignature,
    /// Laser filter kind.
    Filter,
    /// Slam sound effect.
    SlamSound,
    /// Knob effect volume.
    KnobVolume,
    /// Slam sound volume.
    SlamVolume,
    /// Camera zoom, top.
    ZoomTop,
    /// Camera zoom, bottom.
    ZoomBottom,
    /// Camera shift, sideways.
    ZoomSide,
    /// Lane tilt mode.
    Tilt,
    /// Stop length in ticks.
    Stop,
    /// Center lane split.
    LaneSplit,
    /// Long FX note effect for one side.
    FxLong(Side),
    /// Chip FX note sound for one side.
    FxChip(Side),
    /// Doubled laser range marker for one side.
    Laser2x(Side),
}

impl Mark {
    /// Number of mark channels, counting sided kinds once per side.
    pub const COUNT: usize = 18;

    /// All mark channels in storage order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Bpm,
        Self::TimeSignature,
        Self::Filter,
        Self::SlamSound,
        Self::KnobVolume,
        Self::SlamVolume,
        Self::ZoomTop,
        Self::ZoomBottom,
        Self::ZoomSide,
        Self::Tilt,
        Self::Stop,
        Self::LaneSplit,
        Self::FxLong(Side::Left),
        Self::FxLong(Side::Right),
        Self::FxChip(Side::Left),
        Self::FxChip(Side::Right),
        Self::Laser2x(Side::Left),
        Self::Laser2x(Side::Right),
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Bpm => 0,
            Self::TimeSignature => 1,
            Self::Filter => 2,
            Self::SlamSound => 3,
            Self::KnobVolume => 4,
            Self::SlamVolume => 5,
            Self::ZoomTop => 6,
            Self::ZoomBottom => 7,
            Self::ZoomSide => 8,
            Self::Tilt => 9,
            Self::Stop => 10,
            Self::LaneSplit => 11,
            Self::FxLong(side) => 12 + side.index(),
            Self::FxChip(side) => 14 + side.index(),
            Self::Laser2x(side) => 16 + side.index(),
        }
    }
}

/// The knob index meaning "released".
pub const KNOB_RELEASED: i64 = -1;

/// A chart slice: every channel as a timeline, plus the known extent.
///
/// Note lanes store the KSH note state as `i64` (0 = empty, with knob lanes
/// using [`KNOB_RELEASED`] for the released state), mark channels store raw
/// string values, and the spin, comment and other channels store raw lines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    total_time: Tick,
    bt: [IntervalTimeline<i64>; 4],
    fx: [IntervalTimeline<i64>; 2],
    knob: [IntervalTimeline<i64>; 2],
    marks: [IntervalTimeline<String>; Mark::COUNT],
    spins: IntervalTimeline<String>,
    comments: IntervalTimeline<String>,
    others: IntervalTimeline<String>,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            total_time: Tick::ZERO,
            bt: std::array::from_fn(|_| IntervalTimeline::new()),
            fx: std::array::from_fn(|_| IntervalTimeline::new()),
            knob: std::array::from_fn(|_| IntervalTimeline::new()),
            marks: std::array::from_fn(|_| IntervalTimeline::new()),
            spins: IntervalTimeline::new(),
            comments: IntervalTimeline::new(),
            others: IntervalTimeline::new(),
        }
    }
}

impl Chart {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The known extent of the chart.
    #[must_use]
    pub const fn total_time(&self) -> Tick {
        self.total_time
    }

    /// Sets the extent unconditionally.
    pub const fn set_total_time(&mut self, total_time: Tick) {
        self.total_time = total_time;
    }

    /// Extends the extent to cover `end`; never shrinks it.
    pub fn update_total_time(&mut self, end: Tick) {
        self.total_time = self.total_time.max(end);
    }

    /// A BT lane.
    #[must_use]
    pub const fn bt(&self, lane: BtLane) -> &IntervalTimeline<i64> {
        &self.bt[lane.index()]
    }

    /// Mutable access to a BT lane.
    pub const fn bt_mut(&mut self, lane: BtLane) -> &mut IntervalTimeline<i64> {
        &mut self.bt[lane.index()]
    }

    /// An FX lane.
    #[must_use]
    pub const fn fx(&self, side: Side) -> &IntervalTimeline<i64> {
        &self.fx[side.index()]
    }

    /// Mutable access to an FX lane.
    pub const fn fx_mut(&mut self, side: Side) -> &mut IntervalTimeline<i64> {
        &mut self.fx[side.index()]
    }

    /// A laser knob channel, in knob indices.
    #[must_use]
    pub const fn knob(&self, side: Side) -> &IntervalTimeline<i64> {
        &self.knob[side.index()]
    }

    /// Mutable access to a laser knob channel.
    pub const fn knob_mut(&mut self, side: Side) -> &mut IntervalTimeline<i64> {
        &mut self.knob[side.index()]
    }

    /// A mark channel.
    #[must_use]
    pub const fn mark(&self, mark: Mark) -> &IntervalTimeline<String> {
        &self.marks[mark.index()]
    }

    /// Mutable access to a mark channel.
    pub const fn mark_mut(&mut self, mark: Mark) -> &mut IntervalTimeline<String> {
        &mut self.marks[mark.index()]
    }

    /// The lane spin channel.
    #[must_use]
    pub const fn spins(&self) -> &IntervalTimeline<String> {
        &self.spins
    }

    /// Mutable access to the lane spin channel.
    pub const fn spins_mut(&mut self) -> &mut IntervalTimeline<String> {
        &mut self.spins
    }

    /// The comment channel, where commands live.
    #[must_use]
    pub const fn comments(&self) -> &IntervalTimeline<String> {
        &self.comments
    }

    /// Mutable access to the comment channel.
    pub const fn comments_mut(&mut self) -> &mut IntervalTimeline<String> {
        &mut self.comments
    }

    /// Replaces the whole comment channel.
    pub fn set_comments(&mut self, comments: IntervalTimeline<String>) {
        self.comments = comments;
    }

    /// The channel for unrecognized chart lines.
    #[must_use]
    pub const fn others(&self) -> &IntervalTimeline<String> {
        &self.others
    }

    /// Mutable access to the unrecognized-line channel.
    pub const fn others_mut(&mut self) -> &mut IntervalTimeline<String> {
        &mut self.others
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on a BT
    /// lane. Empty input is a no-op.
    pub fn replace_bt(&mut self, lane: BtLane, input: &IntervalTimeline<i64>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.bt[lane.index()], input, offset) {
            self.update_total_time(end);
        }
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on an FX
    /// lane. Empty input is a no-op.
    pub fn replace_fx(&mut self, side: Side, input: &IntervalTimeline<i64>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.fx[side.index()], input, offset) {
            self.update_total_time(end);
        }
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on a knob
    /// channel. Empty input is a no-op.
    pub fn replace_knob(&mut self, side: Side, input: &IntervalTimeline<i64>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.knob[side.index()], input, offset) {
            self.update_total_time(end);
        }
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on a mark
    /// channel. Empty input is a no-op.
    pub fn replace_mark(&mut self, mark: Mark, input: &IntervalTimeline<String>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.marks[mark.index()], input, offset) {
            self.update_total_time(end);
        }
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on the
    /// spin channel. Empty input is a no-op.
    pub fn replace_spins(&mut self, input: &IntervalTimeline<String>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.spins, input, offset) {
            self.update_total_time(end);
        }
    }

    /// Replaces the span covered by `input` (shifted by `offset`) on the
    /// unrecognized-line channel. Empty input is a no-op.
    pub fn replace_others(&mut self, input: &IntervalTimeline<String>, offset: Tick) {
        if let Some(end) = replace_span(&mut self.others, input, offset) {
            self.update_total_time(end);
        }
    }

    /// Shifts every channel by `delta` in place. The extent shifts too.
    pub fn offset_all(&mut self, delta: Tick) {
        for line in &mut self.bt {
            *line = line.offset(delta);
        }
        for line in &mut self.fx {
            *line = line.offset(delta);
        }
        for line in &mut self.knob {
            *line = line.offset(delta);
        }
        for line in &mut self.marks {
            *line = line.offset(delta);
        }
        self.spins = self.spins.offset(delta);
        self.comments = self.comments.offset(delta);
        self.others = self.others.offset(delta);
        self.total_time += delta;
    }

    /// Cuts the window `[start, start + length]` out of every channel,
    /// keeping surrounding context entries so interval state at the window
    /// edges is preserved. The result's extent is `start + length`.
    #[must_use]
    pub fn slice(&self, start: Tick, length: Tick) -> Self {
        let end = start + length;
        Self {
            total_time: end,
            bt: std::array::from_fn(|i| self.bt[i].surrounding(start, end)),
            fx: std::array::from_fn(|i| self.fx[i].surrounding(start, end)),
            knob: std::array::from_fn(|i| self.knob[i].surrounding(start, end)),
            marks: std::array::from_fn(|i| self.marks[i].surrounding(start, end)),
            spins: self.spins.surrounding(start, end),
            comments: self.comments.surrounding(start, end),
            others: self.others.surrounding(start, end),
        }
    }

    /// Replaces the spans covered by `other`'s channels (shifted by
    /// `offset`) with `other`'s content, channel by channel.
    ///
    /// The comment channel is left alone: merging happens while commands
    /// from that channel are being executed.
    pub fn merge_replace(&mut self, other: &Self, offset: Tick) {
        for lane in BtLane::ALL {
            self.replace_bt(lane, other.bt(lane), offset);
        }
        for side in Side::ALL {
            self.replace_fx(side, other.fx(side), offset);
            self.replace_knob(side, other.knob(side), offset);
        }
        for mark in Mark::ALL {
            self.replace_mark(mark, other.mark(mark), offset);
        }
        self.replace_spins(other.spins(), offset);
        self.replace_others(other.others(), offset);
        self.update_total_time(other.total_time() + offset);
    }

    /// The derived real-position view of a knob channel.
    ///
    /// Knob indices are blended with the side's laser-2x mark channel: a
    /// laser segment whose starting key carries a 2x mark maps through the
    /// doubled range `pos * 2 - 25`, ordinary segments map through the index
    /// as-is, and [`KNOB_RELEASED`] passes through unchanged.
    #[must_use]
    pub fn knob_pos(&self, side: Side) -> IntervalTimeline<f64> {
        let knob = &self.knob[side.index()];
        let laser2x = self.mark(Mark::Laser2x(side));

        let mut output = IntervalTimeline::new();
        let mut continuing = false;
        let mut wide = false;
        for (&key, entry) in knob {
            let (before, after) = (*entry.before(), *entry.after());
            wide = (continuing && wide)
                || (!continuing && before != KNOB_RELEASED && laser2x.contains_key(key));
            continuing = after != KNOB_RELEASED;

            let pos = |index: i64| {
                if index == KNOB_RELEASED {
                    -1.0
                } else if wide {
                    2.0 * wide_knob_pos(index) - 25.0
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    {
                        index as f64
                    }
                }
            };
            output.insert_jump(key, pos(before), pos(after));
        }
        output
    }
}

/// Index-to-position mapping for doubled-range lasers. The two indices next
/// to the lane centers sit on half positions.
#[allow(clippy::cast_precision_loss)]
fn wide_knob_pos(index: i64) -> f64 {
    match index {
        12 => 12.5,
        37 => 37.5,
        _ => index as f64,
    }
}

fn replace_span<T: Clone>(
    target: &mut IntervalTimeline<T>,
    input: &IntervalTimeline<T>,
    offset: Tick,
) -> Option<Tick> {
    let (first, _) = input.first()?;
    let (last, _) = input.last()?;
    let (start, end) = (first + offset, last + offset);
    target.remove_range(start..end);
    target.merge(input.offset(offset));
    Some(end)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::timeline::Entry;

    fn notes(entries: &[(i64, i64)]) -> IntervalTimeline<i64> {
        entries
            .iter()
            .map(|&(at, value)| (Tick(at), Entry::Single(value)))
            .collect()
    }

    #[test]
    fn replace_erases_exactly_the_input_span() {
        let mut chart = Chart::new();
        *chart.bt_mut(BtLane::A) = notes(&[(0, 1), (48, 1), (96, 2), (144, 1)]);

        chart.replace_bt(BtLane::A, &notes(&[(48, 0), (96, 1)]), Tick::ZERO);
        assert_eq!(
            chart.bt(BtLane::A),
            &notes(&[(0, 1), (48, 0), (96, 1), (144, 1)])
        );
        assert_eq!(chart.total_time(), Tick(96));

        // Empty input changes nothing.
        chart.replace_bt(BtLane::A, &IntervalTimeline::new(), Tick(100));
        assert_eq!(chart.total_time(), Tick(96));
    }

    #[test]
    fn replace_applies_the_offset_to_the_span_too() {
        let mut chart = Chart::new();
        *chart.fx_mut(Side::Left) = notes(&[(0, 1), (48, 1)]);
        chart.replace_fx(Side::Left, &notes(&[(0, 2)]), Tick(48));
        assert_eq!(chart.fx(Side::Left), &notes(&[(0, 1), (48, 2)]));
    }

    #[test]
    fn slice_keeps_surrounding_context() {
        let mut chart = Chart::new();
        chart.mark_mut(Mark::Bpm).insert(Tick(0), "148".to_string());
        chart
            .mark_mut(Mark::Bpm)
            .insert(Tick(400), "296".to_string());
        *chart.bt_mut(BtLane::B) = notes(&[(96, 1), (144, 1), (192, 1)]);
        chart.set_total_time(Tick(400));

        let window = chart.slice(Tick(100), Tick(92));
        assert_eq!(window.total_time(), Tick(192));
        assert_eq!(window.bt(BtLane::B), &notes(&[(96, 1), (144, 1), (192, 1)]));
        // The BPM in force at the window start comes along.
        assert_eq!(
            window.mark(Mark::Bpm).before_at(Tick(0)),
            Some(&"148".to_string())
        );
    }

    #[test]
    fn merge_replace_leaves_comments_alone() {
        let mut chart = Chart::new();
        chart
            .comments_mut()
            .insert(Tick(0), "//mark bpm 120".to_string());
        let mut patch = Chart::new();
        *patch.bt_mut(BtLane::A) = notes(&[(0, 1)]);
        patch
            .comments_mut()
            .insert(Tick(0), "//mark bpm 240".to_string());
        patch.set_total_time(Tick(48));

        chart.merge_replace(&patch, Tick(96));
        assert_eq!(chart.bt(BtLane::A), &notes(&[(96, 1)]));
        assert_eq!(
            chart.comments().after_at(Tick(0)),
            Some(&"//mark bpm 120".to_string())
        );
        assert_eq!(chart.total_time(), Tick(144));
    }

    #[test]
    fn knob_pos_blends_the_laser2x_channel() {
        let mut chart = Chart::new();
        let knob = chart.knob_mut(Side::Left);
        knob.insert(Tick(0), 0);
        knob.insert_jump(Tick(48), 49, KNOB_RELEASED);
        knob.insert(Tick(96), 12);
        knob.insert_jump(Tick(144), 37, KNOB_RELEASED);
        chart
            .mark_mut(Mark::Laser2x(Side::Left))
            .insert(Tick(96), "2x".to_string());

        let pos = chart.knob_pos(Side::Left);
        // First segment is plain range.
        assert_eq!(pos.get(Tick(0)), Some(&Entry::Single(0.0)));
        assert_eq!(pos.get(Tick(48)), Some(&Entry::jump(49.0, -1.0)));
        // Second segment starts under a 2x mark: half positions, doubled.
        assert_eq!(pos.get(Tick(96)), Some(&Entry::Single(0.0)));
        assert_eq!(pos.get(Tick(144)), Some(&Entry::jump(50.0, -1.0)));
    }
}
