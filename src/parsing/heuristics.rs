//! Best-effort learning blocks for replies that ignored the `BLOCKS:` format.
//!
//! Keyword lists and excerpt lengths are tuning, not contract. Callers can rely
//! on three things only: this never panics, titles are unique, and blocks come
//! out in the order their trigger appears in the text.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::config::HeuristicLimits;
use crate::types::chat::{BlockType, LearningBlock};

lazy_static! {
    static ref CORRECTION_RE: Regex =
        Regex::new(r"(?i)did you mean|corrected|correction|here'?s the breakdown").unwrap();
    static ref HEADING_RE: Regex = Regex::new(r"(?m)^[ \t]*#{1,4}[ \t]*([^#\n][^\n]*)$").unwrap();
    static ref NUMBERING_RE: Regex = Regex::new(r"^\d*\.?\s*").unwrap();
    static ref KEYWORD_RE: Regex = Regex::new(
        r"(?i)\b(grammar|vocabulary|usage|warning|practice|tip|note|important|correction|verb|tense|capital|time|expression)"
    )
    .unwrap();
    static ref CORRECTION_HINT_RE: Regex =
        Regex::new(r"(?i)~~[^~]+~~|strikethrough|original.*corrected|incorrect.*correct").unwrap();
    static ref TIP_HINT_RE: Regex =
        Regex::new(r"(?i)remember|important|note that|keep in mind|tip:").unwrap();
    static ref PRACTICE_HINT_RE: Regex =
        Regex::new(r"(?i)\btry\b|\bpractice|\bexercise|your turn|can you").unwrap();
}

struct Candidate {
    position: usize,
    block: LearningBlock,
}

struct Heading<'a> {
    start: usize,
    block_type: BlockType,
    title: &'a str,
}

pub fn extract_blocks(english: &str, limits: &HeuristicLimits) -> Vec<LearningBlock> {
    if english.trim().is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    if let Some(found) = CORRECTION_RE.find(english) {
        candidates.push(Candidate {
            position: found.start(),
            block: LearningBlock::new(
                BlockType::Grammar,
                "Correction",
                excerpt(&english[found.start()..], limits.correction_excerpt_chars),
                "",
            ),
        });
    }
    candidates.extend(heading_blocks(english, limits.section_excerpt_chars));

    if candidates.is_empty() {
        candidates.extend(indicator_blocks(english));
    }

    candidates.sort_by_key(|c| c.position);
    let mut seen_titles = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen_titles.insert(c.block.title.clone()))
        .map(|c| c.block)
        .collect()
}

fn heading_blocks(english: &str, max_chars: usize) -> Vec<Candidate> {
    let headings: Vec<Heading> = HEADING_RE
        .captures_iter(english)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let text = caps.get(1)?.as_str().trim();
            let numbering = NUMBERING_RE.find(text).map_or(0, |m| m.end());
            let title = text[numbering..].trim_matches('*').trim();
            let keyword = KEYWORD_RE.captures(title)?.get(1)?;
            Some(Heading {
                start: whole.start(),
                block_type: keyword_type(keyword.as_str()),
                title,
            })
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(idx, heading)| {
            let end = headings.get(idx + 1).map_or(english.len(), |next| next.start);
            Candidate {
                position: heading.start,
                block: LearningBlock::new(
                    heading.block_type,
                    heading.title,
                    excerpt(&english[heading.start..end], max_chars),
                    "",
                ),
            }
        })
        .collect()
}

fn keyword_type(keyword: &str) -> BlockType {
    match keyword.to_ascii_lowercase().as_str() {
        "usage" | "vocabulary" | "tip" => BlockType::Usage,
        "warning" | "important" | "note" => BlockType::Warning,
        "practice" => BlockType::Practice,
        _ => BlockType::Grammar,
    }
}

/// Generic blocks pointing back at the reply, at most one per indicator family.
fn indicator_blocks(english: &str) -> Vec<Candidate> {
    let families: [(&Regex, BlockType, &str, &str, &str); 3] = [
        (
            &*CORRECTION_HINT_RE,
            BlockType::Grammar,
            "Grammar Correction",
            "Corrections provided in the response above",
            "תיקונים מופיעים בתשובה למעלה",
        ),
        (
            &*TIP_HINT_RE,
            BlockType::Usage,
            "Learning Tip",
            "Tips provided in the response above",
            "טיפים מופיעים בתשובה למעלה",
        ),
        (
            &*PRACTICE_HINT_RE,
            BlockType::Practice,
            "Practice",
            "Practice exercises in the response above",
            "תרגול מופיע בתשובה למעלה",
        ),
    ];

    families
        .iter()
        .filter_map(|(re, block_type, title, english_text, hebrew_text)| {
            let found = re.find(english)?;
            Some(Candidate {
                position: found.start(),
                block: LearningBlock::new(*block_type, *title, *english_text, *hebrew_text),
            })
        })
        .collect()
}

/// First `max_chars` characters of `text`, trimmed.
fn excerpt(text: &str, max_chars: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    text[..cut].trim().to_string()
}
