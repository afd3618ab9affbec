//! The tick-ordered command queue.

use std::collections::BTreeMap;

use itertools::Itertools;

use super::ParsedCommand;
use super::tokenize::split_keep_groups;
use crate::timeline::{IntervalTimeline, Tick};

/// Commands grouped by tick, FIFO within a tick.
///
/// This is the working set of both the compiler and the scheduler. Commands
/// at the same tick keep their insertion order, so execution order is
/// deterministic: ascending tick, then first-come-first-served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    map: BTreeMap<Tick, Vec<ParsedCommand>>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// Whether no command is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Appends `cmd` at its own tick.
    pub fn insert(&mut self, cmd: ParsedCommand) {
        self.insert_at(cmd.time(), cmd);
    }

    /// Appends `cmd` at queue position `at`, regardless of the command's own
    /// tick. Scheduling position and execution time are separate: a macro
    /// can queue a copy where its source sits while the copy itself acts on
    /// a later tick.
    pub fn insert_at(&mut self, at: Tick, cmd: ParsedCommand) {
        self.map.entry(at).or_default().push(cmd);
    }

    /// Parses a raw `;`-separated command line and queues every non-empty
    /// command at `at`. Braced groups protect their `;` from the split.
    pub fn push_line(&mut self, line: &str, at: Tick) {
        for piece in split_keep_groups(line, ';', false) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let cmd = ParsedCommand::parse(piece, at);
            if !cmd.is_empty() {
                self.insert(cmd);
            }
        }
    }

    /// Builds a queue from a comment channel. Only comments starting with
    /// `//` carry commands; the rest of the line is a `;`-separated command
    /// list pinned to the comment's tick.
    #[must_use]
    pub fn import_comments(comments: &IntervalTimeline<String>) -> Self {
        let mut queue = Self::new();
        for (&at, entry) in comments {
            if let Some(line) = entry.after().strip_prefix("//") {
                queue.push_line(line, at);
            }
        }
        queue
    }

    /// Renders the queue back into a comment channel, one `//cmd1;cmd2`
    /// comment per occupied tick, preserving original command text.
    #[must_use]
    pub fn export_comments(&self) -> IntervalTimeline<String> {
        let mut comments = IntervalTimeline::new();
        for (&at, cmds) in &self.map {
            let line: String = cmds.iter().map(|cmd| cmd.source()).join(";");
            comments.insert(at, format!("//{line}"));
        }
        comments
    }

    /// A copy with every tick (bucket keys and command times) shifted by
    /// `delta`.
    #[must_use]
    pub fn offset(&self, delta: Tick) -> Self {
        let map = self
            .map
            .iter()
            .map(|(&at, cmds)| {
                let cmds = cmds
                    .iter()
                    .cloned()
                    .update(|cmd| cmd.set_time(cmd.time() + delta))
                    .collect();
                (at + delta, cmds)
            })
            .collect();
        Self { map }
    }

    /// Removes and returns the earliest queued command.
    pub fn pop_front(&mut self) -> Option<ParsedCommand> {
        let (&at, bucket) = self.map.iter_mut().next()?;
        let cmd = bucket.remove(0);
        if bucket.is_empty() {
            self.map.remove(&at);
        }
        Some(cmd)
    }

    /// Removes every command whose delay tier is at most `tier`, in
    /// execution order, and reports the smallest delay tier left behind.
    pub fn drain_ready(&mut self, tier: u32) -> (Vec<ParsedCommand>, Option<u32>) {
        let mut ready = Vec::new();
        let mut next_tier: Option<u32> = None;
        self.map.retain(|_, bucket| {
            let mut kept = Vec::with_capacity(bucket.len());
            for cmd in bucket.drain(..) {
                if cmd.delay() <= tier {
                    ready.push(cmd);
                } else {
                    next_tier = Some(next_tier.map_or(cmd.delay(), |t| t.min(cmd.delay())));
                    kept.push(cmd);
                }
            }
            *bucket = kept;
            !bucket.is_empty()
        });
        (ready, next_tier)
    }

    /// Moves the `index`-th command at `at` to `new_time`, keeping the order
    /// of its former siblings. Returns whether the command existed.
    pub fn retime(&mut self, at: Tick, index: usize, new_time: Tick) -> bool {
        let Some(bucket) = self.map.get_mut(&at) else {
            return false;
        };
        if index >= bucket.len() {
            return false;
        }
        let mut cmd = bucket.remove(index);
        if bucket.is_empty() {
            self.map.remove(&at);
        }
        cmd.set_time(new_time);
        self.insert(cmd);
        true
    }

    /// Finds the command closest to `from` whose normalized text is `text`
    /// and whose delay tier is `delay`. Ties resolve to the earlier tick.
    #[must_use]
    pub fn find_nearest(&self, text: &str, from: Tick, delay: u32) -> Option<(Tick, usize)> {
        self.map
            .iter()
            .flat_map(|(&at, cmds)| {
                cmds.iter()
                    .enumerate()
                    .map(move |(index, cmd)| (at, index, cmd))
            })
            .filter(|(_, _, cmd)| cmd.delay() == delay && cmd.to_string() == text)
            .min_by_key(|&(at, _, _)| (at - from).0.abs())
            .map(|(at, index, _)| (at, index))
    }

    /// Iterates commands in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedCommand> {
        self.map.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn comment_round_trip_preserves_source_text() {
        let mut comments = IntervalTimeline::new();
        comments.insert(Tick(0), "//Mark BPM 148;#1 mark stop 192".to_string());
        comments.insert(Tick(48), "plain chart comment".to_string());
        comments.insert(Tick(96), "//loop 2 1 {a;b}".to_string());

        let queue = CommandQueue::import_comments(&comments);
        assert_eq!(queue.len(), 3);

        let texts: Vec<String> = queue.iter().map(ToString::to_string).collect();
        assert_eq!(texts, vec!["mark bpm 148", "mark stop 192", "loop 2 1 a;b"]);

        let exported = queue.export_comments();
        assert_eq!(
            exported.after_at(Tick(0)),
            Some(&"//Mark BPM 148;#1 mark stop 192".to_string())
        );
        assert_eq!(
            exported.after_at(Tick(96)),
            Some(&"//loop 2 1 {a;b}".to_string())
        );
        assert_eq!(exported.get(Tick(48)), None);
    }

    #[test]
    fn drain_ready_takes_at_most_the_tier_and_reports_the_next() {
        let mut queue = CommandQueue::new();
        queue.push_line("a;#2 b;#5 c", Tick(0));
        queue.push_line("#1 d", Tick(48));

        let (ready, next) = queue.drain_ready(0);
        let texts: Vec<String> = ready.iter().map(ToString::to_string).collect();
        assert_eq!(texts, vec!["a"]);
        assert_eq!(next, Some(1));

        let (ready, next) = queue.drain_ready(2);
        let texts: Vec<String> = ready.iter().map(ToString::to_string).collect();
        assert_eq!(texts, vec!["b", "d"]);
        assert_eq!(next, Some(5));

        let (ready, next) = queue.drain_ready(5);
        assert_eq!(ready.len(), 1);
        assert_eq!(next, None);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_front_is_tick_then_fifo() {
        let mut queue = CommandQueue::new();
        queue.push_line("late", Tick(96));
        queue.push_line("first;second", Tick(0));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop_front())
            .map(|cmd| cmd.to_string())
            .collect();
        assert_eq!(order, vec!["first", "second", "late"]);
    }

    #[test]
    fn offset_rewrites_command_times() {
        let mut queue = CommandQueue::new();
        queue.push_line("a", Tick(10));
        let shifted = queue.offset(Tick(38));
        let cmd = shifted.iter().next().unwrap();
        assert_eq!(cmd.time(), Tick(48));
    }

    #[test]
    fn retime_keeps_sibling_order() {
        let mut queue = CommandQueue::new();
        queue.push_line("a;b;c", Tick(0));
        assert!(queue.retime(Tick(0), 1, Tick(96)));

        let texts: Vec<(Tick, String)> = std::iter::from_fn(|| queue.pop_front())
            .map(|cmd| (cmd.time(), cmd.to_string()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (Tick(0), "a".to_string()),
                (Tick(0), "c".to_string()),
                (Tick(96), "b".to_string()),
            ]
        );
        assert!(!queue.retime(Tick(0), 5, Tick(1)));
    }

    #[test]
    fn find_nearest_prefers_the_closest_tick() {
        let mut queue = CommandQueue::new();
        queue.push_line("mark bpm 148", Tick(0));
        queue.push_line("mark bpm 148", Tick(192));
        queue.push_line("#1 mark bpm 148", Tick(100));

        assert_eq!(
            queue.find_nearest("mark bpm 148", Tick(150), 0),
            Some((Tick(192), 0))
        );
        assert_eq!(
            queue.find_nearest("mark bpm 148", Tick(150), 1),
            Some((Tick(100), 0))
        );
        assert_eq!(queue.find_nearest("mark bpm 60", Tick(0), 0), None);
    }
}
