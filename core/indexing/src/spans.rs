//! Code fence segmentation.
//!
//! A line starting with a run of three or more backticks opens a fence; the
//! next line made only of at least as many backticks (plus trailing
//! whitespace) closes it. An unclosed fence runs to the end of the text.

use regex::Regex;
use std::sync::LazyLock;

use crate::frontmatter::LineSpans;

const MIN_FENCE: usize = 3;

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    /// Opening fence line through closing fence line, terminators included
    Fenced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

impl Segment<'_> {
    pub fn is_fenced(&self) -> bool {
        self.kind == SegmentKind::Fenced
    }
}

enum ScanState {
    Outside { plain_start: usize },
    Inside { fence_start: usize, ticks: usize },
}

/// Split `text` into alternating plain and fenced segments.
///
/// Concatenating the segment texts reproduces `text` exactly. Empty segments
/// are never emitted.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut state = ScanState::Outside { plain_start: 0 };

    let mut push = |kind, range: std::ops::Range<usize>| {
        if !range.is_empty() {
            out.push(Segment {
                kind,
                text: &text[range],
            });
        }
    };

    for (start, end, line) in LineSpans::new(text) {
        state = match state {
            ScanState::Outside { plain_start } if backtick_run(line) >= MIN_FENCE => {
                push(SegmentKind::Plain, plain_start..start);
                ScanState::Inside {
                    fence_start: start,
                    ticks: backtick_run(line),
                }
            }
            ScanState::Inside { fence_start, ticks } if is_closing_fence(line, ticks) => {
                push(SegmentKind::Fenced, fence_start..end);
                ScanState::Outside { plain_start: end }
            }
            other => other,
        };
    }

    match state {
        ScanState::Outside { plain_start } => push(SegmentKind::Plain, plain_start..text.len()),
        ScanState::Inside { fence_start, .. } => push(SegmentKind::Fenced, fence_start..text.len()),
    }

    out
}

/// Length of the backtick run at the start of `line`
fn backtick_run(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'`').count()
}

fn is_closing_fence(line: &str, ticks: usize) -> bool {
    let run = backtick_run(line);
    run >= ticks && line[run..].trim().is_empty()
}

/// Text with fenced blocks and inline code spans removed
pub fn strip_code(text: &str) -> String {
    segments(text)
        .iter()
        .filter(|s| !s.is_fenced())
        .map(|s| INLINE_CODE_RE.replace_all(s.text, ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(SegmentKind, &str)> {
        segments(text).into_iter().map(|s| (s.kind, s.text)).collect()
    }

    #[test]
    fn test_segments_alternate() {
        let text = "before\n```rust\nlet x = [[a]];\n```\nafter\n";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Plain, "before\n"),
                (SegmentKind::Fenced, "```rust\nlet x = [[a]];\n```\n"),
                (SegmentKind::Plain, "after\n"),
            ]
        );
    }

    #[test]
    fn test_segments_concatenate_to_input() {
        let text = "a\r\n```\r\nb\r\n```  \r\nc\n```\nunclosed";
        let joined: String = segments(text).iter().map(|s| s.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "x\n```\n[[a]]\nmore";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Plain, "x\n"),
                (SegmentKind::Fenced, "```\n[[a]]\nmore"),
            ]
        );
    }

    #[test]
    fn test_info_string_does_not_close() {
        let text = "```\n```js\n```\ntail";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Fenced, "```\n```js\n```\n"),
                (SegmentKind::Plain, "tail"),
            ]
        );
    }

    #[test]
    fn test_long_fence_closes_on_matching_run() {
        let text = "````\n```\nstill code\n````\n[[a]]\n";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Fenced, "````\n```\nstill code\n````\n"),
                (SegmentKind::Plain, "[[a]]\n"),
            ]
        );
    }

    #[test]
    fn test_longer_closing_run_closes() {
        let text = "```\ncode\n`````  \n[[a]]";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Fenced, "```\ncode\n`````  \n"),
                (SegmentKind::Plain, "[[a]]"),
            ]
        );
    }

    #[test]
    fn test_indented_backticks_do_not_open() {
        let text = "  ```\n[[a]]\n";
        assert_eq!(kinds(text), vec![(SegmentKind::Plain, text)]);
    }

    #[test]
    fn test_strip_code() {
        let text = "see [[a]] and `[[b]]`\n```\n[[c]]\n```\nend [[d]]";
        assert_eq!(strip_code(text), "see [[a]] and \nend [[d]]");
        assert_eq!(strip_code("```\nonly code\n```\n").trim(), "");
    }
}
