//! Splits a raw completion into its English body and Hebrew summary.
//!
//! Nominal shape:
//!
//! ```text
//! English: [ ...markdown body... ]
//! Hebrew: [ ...summary... ]
//! BLOCKS: [ [GRAMMAR] Title / EN: / HE: / EX: lines ]
//! ```
//!
//! Models drift from that shape, so each step has fallbacks and nothing here fails.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::chat::ParsedSections;

lazy_static! {
    static ref BLOCKS_LABEL_RE: Regex = Regex::new(r"BLOCKS:\s*\[").unwrap();
    // A block tag opening a line, or directly after the `]` that closes the Hebrew section.
    static ref BARE_TAG_RE: Regex =
        Regex::new(r"(?im)(?:^|\])[ \t]*(\[(?:GRAMMAR|USAGE|WARNING|PRACTICE|VOCABULARY)\])").unwrap();
    static ref BRACKETED_RE: Regex =
        Regex::new(r"(?is)english:\s*\[(.*)hebrew:\s*\[(.*)\]\s*$").unwrap();
    static ref HEBREW_LINE_RE: Regex = Regex::new(r"(?im)^[ \t]*hebrew:").unwrap();
    static ref SECTION_OPEN_RE: Regex = Regex::new(r"(?i)(?:english|hebrew):\s*\[").unwrap();
    static ref ENGLISH_LABEL_RE: Regex = Regex::new(r"(?i)^\s*english:\s*").unwrap();
    static ref ORPHAN_BLOCKS_RE: Regex = Regex::new(r"(?s)\s*BLOCKS:\s*\[.*").unwrap();
    // A tag alone at the start of a line takes its line break with it.
    static ref STRAY_TAG_RE: Regex = Regex::new(
        r"(?im)^[ \t]*\[(?:GRAMMAR|USAGE|WARNING|PRACTICE|VOCABULARY)\][^\n]*(?:\n|$)|[ \t]*\[(?:GRAMMAR|USAGE|WARNING|PRACTICE|VOCABULARY)\][^\n]*"
    )
    .unwrap();
    static ref FIELD_LINE_RE: Regex = Regex::new(r"(?m)^[ \t]*(?:EN|HE|EX):[^\n]*(?:\n|$)").unwrap();
}

/// How the learning-blocks tail was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlocksFormat {
    /// `BLOCKS: [ ... ]`
    Bracketed,
    /// `BLOCKS: [ ...` running to the end of the text.
    Unterminated,
    /// `[GRAMMAR] ...` sections with no `BLOCKS:` label.
    BareTags,
}

/// The learning-blocks section found at the end of a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlocksTail<'a> {
    /// Byte offset where the tail starts; everything from here on is block content.
    pub start: usize,
    /// Text inside the section, without the label and outer brackets.
    pub payload: &'a str,
    pub format: BlocksFormat,
}

impl BlocksTail<'_> {
    /// `BLOCKS: [none]` means the model had nothing to annotate.
    pub fn is_none_marker(&self) -> bool {
        self.payload.trim().eq_ignore_ascii_case("none")
    }
}

pub fn locate_blocks(raw: &str) -> Option<BlocksTail<'_>> {
    if let Some(label) = BLOCKS_LABEL_RE.find(raw) {
        let rest = &raw[label.end()..];
        if let Some(inner) = rest.trim_end().strip_suffix(']') {
            return Some(BlocksTail {
                start: label.start(),
                payload: inner.trim(),
                format: BlocksFormat::Bracketed,
            });
        }
        return Some(BlocksTail {
            start: label.start(),
            payload: rest.trim(),
            format: BlocksFormat::Unterminated,
        });
    }

    // Bare tags only count once both display sections are behind them.
    let tag = BARE_TAG_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find(|tag| {
            let rest = &raw[tag.start()..];
            !HEBREW_LINE_RE.is_match(rest) && !SECTION_OPEN_RE.is_match(rest)
        })?;
    Some(BlocksTail {
        start: tag.start(),
        payload: raw[tag.start()..].trim(),
        format: BlocksFormat::BareTags,
    })
}

/// Which splitting strategy produced the sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Bracketed,
    LineAnchored,
    Unstructured,
}

/// Splits `raw` into display-ready English and Hebrew sections.
pub fn split(raw: &str) -> ParsedSections {
    split_with_strategy(raw).0
}

pub fn split_with_strategy(raw: &str) -> (ParsedSections, SplitStrategy) {
    let body = match locate_blocks(raw) {
        Some(tail) => &raw[..tail.start],
        None => raw,
    }
    .trim();

    let (english, hebrew, strategy) = if let Some(caps) = BRACKETED_RE.captures(body) {
        let english = caps.get(1).map_or("", |m| m.as_str()).trim();
        // Greedy capture runs up to the last `Hebrew: [`; drop the `]` that closed the English body.
        let english = english.strip_suffix(']').unwrap_or(english).trim();
        let hebrew = caps.get(2).map_or("", |m| m.as_str()).trim();
        (english.to_string(), hebrew.to_string(), SplitStrategy::Bracketed)
    } else if let Some(label) = HEBREW_LINE_RE.find(body) {
        let english = ENGLISH_LABEL_RE.replace(&body[..label.start()], "");
        (
            strip_brackets(&english),
            strip_brackets(&body[label.end()..]),
            SplitStrategy::LineAnchored,
        )
    } else {
        let english = ENGLISH_LABEL_RE.replace(body, "");
        (strip_brackets(&english), String::new(), SplitStrategy::Unstructured)
    };

    tracing::debug!(
        ?strategy,
        english_len = english.len(),
        hebrew_len = hebrew.len(),
        "split completion"
    );

    let sections = ParsedSections {
        english: clean_display_text(&english),
        hebrew: clean_display_text(&hebrew),
    };
    (sections, strategy)
}

/// Removes one leading `[` and one trailing `]`.
fn strip_brackets(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('[').unwrap_or(text);
    let text = text.strip_suffix(']').unwrap_or(text);
    text.trim().to_string()
}

/// Deletes block markup that leaked into a display section.
fn clean_display_text(text: &str) -> String {
    let text = ORPHAN_BLOCKS_RE.replace_all(text, "");
    let text = STRAY_TAG_RE.replace_all(&text, "");
    let text = FIELD_LINE_RE.replace_all(&text, "");
    text.trim().to_string()
}
