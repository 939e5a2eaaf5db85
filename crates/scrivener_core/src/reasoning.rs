//! Splitting model output into visible prose and reasoning spans.
//!
//! Reasoning models wrap their scratch work in `<think>...</think>`. Stored
//! chapter content keeps those spans verbatim; everything that counts or
//! displays words goes through [`parse_segments`].

use serde::{Deserialize, Serialize};

/// Tag opening a reasoning span.
pub const OPEN_TAG: &str = "<think>";
/// Tag closing a reasoning span.
pub const CLOSE_TAG: &str = "</think>";

/// Kind of a content segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentKind {
    /// Story text
    Prose,
    /// Model scratch work
    Reasoning,
}

/// A run of content of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment kind
    pub kind: SegmentKind,
    /// Segment text without tags
    pub text: String,
}

/// Splits content into ordered prose and reasoning segments.
///
/// An opening tag that is never closed turns the rest of the content into
/// reasoning, which is what a stream looks like mid-thought. A closing tag
/// with no opening tag before it marks everything before it as reasoning.
/// Empty segments are dropped.
///
/// # Examples
///
/// ```
/// use scrivener_core::{parse_segments, SegmentKind};
///
/// let segments = parse_segments("<think>plan</think>Once upon a time");
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].kind, SegmentKind::Reasoning);
/// assert_eq!(segments[1].text, "Once upon a time");
/// ```
pub fn parse_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = content;

    if let Some(close) = rest.find(CLOSE_TAG)
        && rest.find(OPEN_TAG).is_none_or(|open| open > close)
    {
        push(&mut segments, SegmentKind::Reasoning, &rest[..close]);
        rest = &rest[close + CLOSE_TAG.len()..];
    }

    loop {
        let Some(open) = rest.find(OPEN_TAG) else {
            push(&mut segments, SegmentKind::Prose, rest);
            break;
        };
        push(&mut segments, SegmentKind::Prose, &rest[..open]);
        let inner = &rest[open + OPEN_TAG.len()..];
        match inner.find(CLOSE_TAG) {
            Some(close) => {
                push(&mut segments, SegmentKind::Reasoning, &inner[..close]);
                rest = &inner[close + CLOSE_TAG.len()..];
            }
            None => {
                push(&mut segments, SegmentKind::Reasoning, inner);
                break;
            }
        }
    }

    segments
}

fn push(segments: &mut Vec<Segment>, kind: SegmentKind, text: &str) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment {
        kind,
        text: text.to_string(),
    });
}

/// The prose of `content` with reasoning spans removed, trimmed.
pub fn visible_text(content: &str) -> String {
    parse_segments(content)
        .into_iter()
        .filter(|segment| segment.kind == SegmentKind::Prose)
        .map(|segment| segment.text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word count of the visible prose only.
///
/// # Examples
///
/// ```
/// use scrivener_core::visible_word_count;
///
/// assert_eq!(visible_word_count("<think>a b c d</think>The end."), 2);
/// ```
pub fn visible_word_count(content: &str) -> usize {
    word_count(&visible_text(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(content: &str) -> Vec<(SegmentKind, String)> {
        parse_segments(content)
            .into_iter()
            .map(|s| (s.kind, s.text))
            .collect()
    }

    #[test]
    fn plain_text_is_one_prose_segment() {
        assert_eq!(
            kinds("The tide came in."),
            vec![(SegmentKind::Prose, "The tide came in.".to_string())]
        );
    }

    #[test]
    fn interleaved_spans_keep_order() {
        assert_eq!(
            kinds("A<think>x</think>B<think>y</think>C"),
            vec![
                (SegmentKind::Prose, "A".to_string()),
                (SegmentKind::Reasoning, "x".to_string()),
                (SegmentKind::Prose, "B".to_string()),
                (SegmentKind::Reasoning, "y".to_string()),
                (SegmentKind::Prose, "C".to_string()),
            ]
        );
    }

    #[test]
    fn unclosed_span_runs_to_end() {
        assert_eq!(
            kinds("Intro <think>still deciding"),
            vec![
                (SegmentKind::Prose, "Intro ".to_string()),
                (SegmentKind::Reasoning, "still deciding".to_string()),
            ]
        );
        assert_eq!(visible_text("Intro <think>still deciding"), "Intro");
    }

    #[test]
    fn leading_stray_close_tag_marks_reasoning() {
        assert_eq!(
            kinds("hmm, a ghost story</think>The fog rolled in."),
            vec![
                (SegmentKind::Reasoning, "hmm, a ghost story".to_string()),
                (SegmentKind::Prose, "The fog rolled in.".to_string()),
            ]
        );
    }

    #[test]
    fn empty_spans_are_dropped() {
        assert_eq!(
            kinds("<think></think>Story"),
            vec![(SegmentKind::Prose, "Story".to_string())]
        );
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn counts_ignore_reasoning() {
        let content = "<think>one two three</think>\n\nFour five six seven.";
        assert_eq!(word_count(content), 7);
        assert_eq!(visible_word_count(content), 4);
    }
}
