//! Candidate email recognition in raw text

use crate::types::{EmailCandidate, PatternKind};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// Recognition patterns, highest priority first
static STANDARD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,24}\b").unwrap()
});

// Whitespace is accepted around '@' (including line breaks from PDF layout).
// The dots of the domain are either all spaced or all tight, so a sentence
// break after an ordinary address is not glued onto it.
static SPACED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)[a-z0-9._-]+\s*@\s*[a-z0-9-]+",
        r"(?:(?:\.[a-z0-9-]+)*\.[a-z]{2,24}|(?:\s+\.\s+[a-z0-9-]+)*\s+\.\s+[a-z]{2,24})\b",
    ))
    .unwrap()
});

static FULL_WIDTH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._-]+[@＠][a-z0-9-]+(?:[.．][a-z0-9-]+)*[.．][a-z]{2,24}\b").unwrap()
});

static MAILTO_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+?)\]\(mailto:([^)]+?)\)").unwrap());

static BOLD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+?)\*\*").unwrap());

static ITALIC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+?)\*").unwrap());

/// Scans text with the ordered recognition patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailPatternMatcher;

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    pattern: PatternKind,
}

impl Span {
    const fn len(&self) -> usize {
        self.end - self.start
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl EmailPatternMatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn patterns() -> [(PatternKind, &'static Regex); 3] {
        [
            (PatternKind::Standard, &*STANDARD_REGEX),
            (PatternKind::Spaced, &*SPACED_REGEX),
            (PatternKind::FullWidth, &*FULL_WIDTH_REGEX),
        ]
    }

    /// Find candidate emails in `text`, in text order.
    ///
    /// Where matches from different patterns overlap, the longest span is
    /// kept; equal lengths go to the higher-priority pattern.
    #[must_use]
    pub fn find(&self, text: &str, source: &str) -> Vec<EmailCandidate> {
        let text = clean_markup(text);

        let mut spans: Vec<Span> = Self::patterns()
            .into_iter()
            .flat_map(|(pattern, regex)| {
                regex.find_iter(&text).map(move |m| Span {
                    start: m.start(),
                    end: m.end(),
                    pattern,
                })
            })
            .collect();

        spans.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then(a.pattern.cmp(&b.pattern))
                .then(a.start.cmp(&b.start))
        });

        let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans {
            if !kept.iter().any(|k| k.overlaps(&span)) {
                kept.push(span);
            }
        }
        kept.sort_by_key(|s| s.start);

        kept.into_iter()
            .map(|span| {
                let raw = &text[span.start..span.end];
                EmailCandidate {
                    raw: raw.to_string(),
                    collapsed: collapse(raw),
                    pattern: span.pattern,
                    position: span.start,
                    source: source.to_string(),
                }
            })
            .collect()
    }
}

/// Remove markdown link and emphasis wrappers
fn clean_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['[', '*']) {
        return Cow::Borrowed(text);
    }
    let text = MAILTO_LINK_REGEX.replace_all(text, "$2");
    let text = BOLD_REGEX.replace_all(&text, "$1").into_owned();
    Cow::Owned(ITALIC_REGEX.replace_all(&text, "$1").into_owned())
}

/// Collapse an obfuscated span to standard form
fn collapse(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '＠' => '@',
            '．' => '.',
            other => other,
        })
        .collect()
}
