//! Command text: parsing, typed argument access, and the ordered queue.

pub mod queue;
pub mod tokenize;

use std::borrow::Cow;

pub use queue::CommandQueue;

use crate::timeline::Tick;

/// One parsed command: a lowercased word list pinned to a tick, with an
/// execution delay tier.
///
/// Parsing splits on whitespace brace-aware (so a `{...}` body is a single
/// word, with its outer braces stripped) and lowercases every word. A
/// leading `#<integer>` word is consumed as the delay tier. The raw source
/// text is kept for diagnostics and comment round trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    time: Tick,
    delay: u32,
    source: String,
    words: Vec<String>,
}

impl ParsedCommand {
    /// Parses `source` into a command at `time`.
    #[must_use]
    pub fn parse(source: &str, time: Tick) -> Self {
        let mut words = tokenize::split_words(source, true);
        for word in &mut words {
            word.make_ascii_lowercase();
        }
        let mut delay = 0;
        if let Some(first) = words.first()
            && let Some(digits) = first.strip_prefix('#')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && let Ok(tier) = digits.parse::<u32>()
        {
            delay = tier;
            words.remove(0);
        }
        Self {
            time,
            delay,
            source: source.to_string(),
            words,
        }
    }

    /// Whether the command has no words at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The command word, or `""` for an empty command.
    #[must_use]
    pub fn word(&self) -> &str {
        self.words.first().map_or("", String::as_str)
    }

    /// Whether the command word equals `word`.
    #[must_use]
    pub fn matches(&self, word: &str) -> bool {
        self.word() == word
    }

    /// Number of arguments after the command word.
    #[must_use]
    pub fn arg_len(&self) -> usize {
        self.words.len().saturating_sub(1)
    }

    /// The `index`-th argument, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.words.get(index + 1).map(String::as_str)
    }

    /// The tick the command is pinned to.
    #[must_use]
    pub const fn time(&self) -> Tick {
        self.time
    }

    /// Re-pins the command to `time`.
    pub const fn set_time(&mut self, time: Tick) {
        self.time = time;
    }

    /// The execution delay tier.
    #[must_use]
    pub const fn delay(&self) -> u32 {
        self.delay
    }

    /// Sets the execution delay tier.
    pub const fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// The original source text, or the normalized form when the command was
    /// built without one.
    #[must_use]
    pub fn source(&self) -> Cow<'_, str> {
        if self.source.is_empty() {
            Cow::Owned(self.to_string())
        } else {
            Cow::Borrowed(&self.source)
        }
    }

    /// The `index`-th argument as an integer.
    #[must_use]
    pub fn arg_int(&self, index: usize) -> Option<i64> {
        self.arg(index)?.parse().ok()
    }

    /// The `index`-th argument as a finite float.
    #[must_use]
    pub fn arg_f64(&self, index: usize) -> Option<f64> {
        self.arg(index)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// The `index`-th argument as a boolean, written `t`/`true`/`f`/`false`.
    #[must_use]
    pub fn arg_bool(&self, index: usize) -> Option<bool> {
        match self.arg(index)? {
            "t" | "true" => Some(true),
            "f" | "false" => Some(false),
            _ => None,
        }
    }

    /// The `index`-th argument as an `a/b` ratio, scaled by `amp`.
    #[must_use]
    pub fn arg_ratio(&self, index: usize, amp: f64) -> Option<f64> {
        let (numer, denom) = self.arg(index)?.split_once('/')?;
        let numer: f64 = numer.parse().ok()?;
        let denom: f64 = denom.parse().ok()?;
        let value = numer * amp / denom;
        value.is_finite().then_some(value)
    }

    /// The `index`-th argument as either a float or an `a/b` ratio, scaled
    /// by `amp`. This is the reading beat-denominated arguments use.
    #[must_use]
    pub fn arg_scaled(&self, index: usize, amp: f64) -> Option<f64> {
        if self.arg(index)?.contains('/') {
            self.arg_ratio(index, amp)
        } else {
            self.arg_f64(index).map(|v| v * amp)
        }
    }

    /// Arguments `begin ..` rejoined into one string, ending before argument
    /// `end` when `end >= 0` or `-end - 1` arguments before the last one
    /// otherwise. `end == -1` reaches the final argument.
    #[must_use]
    pub fn substring(&self, begin: usize, end: isize) -> String {
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let stop = if end >= 0 {
            end as usize
        } else {
            (self.words.len() as isize + 1 + end).max(0) as usize
        };
        let stop = stop.min(self.words.len());
        if begin + 1 >= stop {
            return String::new();
        }
        self.words[begin + 1..stop].join(" ")
    }
}

impl std::fmt::Display for ParsedCommand {
    /// The normalized form: lowercased words joined by single spaces, delay
    /// tier omitted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_lowercases_and_takes_the_delay_tier() {
        let cmd = ParsedCommand::parse("#2 Loop 4 1 {Mark Stop 192}", Tick(96));
        assert_eq!(cmd.delay(), 2);
        assert_eq!(cmd.time(), Tick(96));
        assert_eq!(cmd.word(), "loop");
        assert_eq!(cmd.arg(2), Some("mark stop 192"));
        assert_eq!(cmd.to_string(), "loop 4 1 mark stop 192");
        assert_eq!(cmd.source(), "#2 Loop 4 1 {Mark Stop 192}");
    }

    #[test]
    fn hash_word_without_digits_is_a_plain_word() {
        let cmd = ParsedCommand::parse("#fx blah", Tick::ZERO);
        assert_eq!(cmd.delay(), 0);
        assert_eq!(cmd.word(), "#fx");

        let empty = ParsedCommand::parse("  ", Tick::ZERO);
        assert!(empty.is_empty());
        assert_eq!(empty.word(), "");
    }

    #[test]
    fn typed_argument_readers() {
        let cmd = ParsedCommand::parse("x 3 1.5 3/4 t nope", Tick::ZERO);
        assert_eq!(cmd.arg_len(), 5);
        assert_eq!(cmd.arg_int(0), Some(3));
        assert_eq!(cmd.arg_f64(1), Some(1.5));
        assert_eq!(cmd.arg_ratio(2, 48.0), Some(36.0));
        assert_eq!(cmd.arg_scaled(2, 48.0), Some(36.0));
        assert_eq!(cmd.arg_scaled(1, 48.0), Some(72.0));
        assert_eq!(cmd.arg_bool(3), Some(true));
        assert_eq!(cmd.arg_bool(4), None);
        assert_eq!(cmd.arg_int(4), None);
        assert_eq!(cmd.arg(5), None);
    }

    #[test]
    fn substring_counts_from_either_end() {
        let cmd = ParsedCommand::parse("loop 4 1 a b c", Tick::ZERO);
        assert_eq!(cmd.substring(2, -1), "a b c");
        assert_eq!(cmd.substring(0, -1), "4 1 a b c");
        assert_eq!(cmd.substring(2, -2), "a b");
        assert_eq!(cmd.substring(0, 3), "4 1");
        assert_eq!(cmd.substring(4, -3), "");
    }
}
