//! Brace-aware splitting for command text.
//!
//! Braces group text into a single token so command bodies (`loop 4 1 {mark
//! stop 192}`) survive both the `;` line split and the whitespace word
//! split. One level of outer braces can be stripped while splitting, which
//! is how a body loses its delimiters exactly once per parsing level.

/// Splits `input` at top-level occurrences of `sep`, keeping braced groups
/// intact. Empty pieces are dropped.
///
/// With `strip_outer`, the outermost brace pair around a group is removed
/// (an unbalanced closing brace goes with it); nested braces are always
/// kept.
pub fn split_keep_groups(input: &str, sep: char, strip_outer: bool) -> Vec<String> {
    let mut output = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in input.chars() {
        match ch {
            _ if ch == sep && depth == 0 => flush(&mut output, &mut current),
            '{' => {
                if depth >= 1 || !strip_outer {
                    current.push(ch);
                }
                depth += 1;
            }
            '}' => {
                if depth > 1 || !strip_outer {
                    current.push(ch);
                }
                depth = depth.saturating_sub(1);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut output, &mut current);
    output
}

/// Splits `input` at top-level whitespace, keeping braced groups intact.
///
/// Unlike [`split_keep_groups`], a top-level braced group always becomes a
/// token of its own, even when it abuts non-space text.
pub fn split_words(input: &str, strip_outer: bool) -> Vec<String> {
    let mut output = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in input.chars() {
        match ch {
            _ if ch.is_whitespace() && depth == 0 => flush(&mut output, &mut current),
            '{' => {
                if depth == 0 {
                    flush(&mut output, &mut current);
                }
                if depth >= 1 || !strip_outer {
                    current.push(ch);
                }
                depth += 1;
            }
            '}' => {
                if depth > 1 || !strip_outer {
                    current.push(ch);
                }
                if depth == 1 {
                    flush(&mut output, &mut current);
                }
                depth = depth.saturating_sub(1);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut output, &mut current);
    output
}

fn flush(output: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        output.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn separator_split_respects_groups() {
        assert_eq!(
            split_keep_groups("a;loop 2 1 {b;c};d", ';', false),
            vec!["a", "loop 2 1 {b;c}", "d"]
        );
        assert_eq!(split_keep_groups(";;a;;", ';', false), vec!["a"]);
    }

    #[test]
    fn outer_braces_strip_once() {
        assert_eq!(split_keep_groups("{a;{b;c}}", ';', true), vec!["a;{b;c}"]);
        assert_eq!(
            split_keep_groups("{a;{b;c}}", ';', false),
            vec!["{a;{b;c}}"]
        );
    }

    #[test]
    fn word_split_makes_groups_standalone_tokens() {
        assert_eq!(
            split_words("loop 4 1 {mark stop 192}", true),
            vec!["loop", "4", "1", "mark stop 192"]
        );
        assert_eq!(
            split_words("loop 2 1 {loop 2 1 {mark stop 12}}", true),
            vec!["loop", "2", "1", "loop 2 1 {mark stop 12}"]
        );
        // A group glued to a word still separates.
        assert_eq!(split_words("a{b}c", true), vec!["a", "b", "c"]);
    }

    #[test]
    fn stray_closers_are_plain_text() {
        assert_eq!(split_words("a } b", true), vec!["a", "b"]);
        assert_eq!(split_keep_groups("a}b", ';', false), vec!["a}b"]);
    }
}
