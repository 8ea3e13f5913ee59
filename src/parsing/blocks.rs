use lazy_static::lazy_static;
use regex::Regex;

use crate::config::HeuristicLimits;
use crate::parsing::heuristics;
use crate::parsing::sections::locate_blocks;
use crate::types::chat::{BilingualText, BlockType, LearningBlock};

lazy_static! {
    static ref TYPE_TAG_RE: Regex =
        Regex::new(r"(?i)\[(GRAMMAR|USAGE|WARNING|PRACTICE|VOCABULARY)\]").unwrap();
}

// This enum stays local to the segment scanner
#[derive(Debug, PartialEq, Clone, Copy)]
enum FieldMarker {
    English,
    Hebrew,
    Example,
}

impl FieldMarker {
    fn split_line(line: &str) -> Option<(FieldMarker, &str)> {
        let (marker, rest) = if let Some(rest) = line.strip_prefix("EN:") {
            (FieldMarker::English, rest)
        } else if let Some(rest) = line.strip_prefix("HE:") {
            (FieldMarker::Hebrew, rest)
        } else if let Some(rest) = line.strip_prefix("EX:") {
            (FieldMarker::Example, rest)
        } else {
            return None;
        };
        Some((marker, rest.trim()))
    }
}

/// Learning blocks for one completion.
///
/// Uses the `BLOCKS:` section when it yields anything; otherwise scans the
/// English body heuristically. An explicit `BLOCKS: [none]` disables the scan.
pub fn decode(raw: &str, english: &str) -> Vec<LearningBlock> {
    decode_with(raw, english, &HeuristicLimits::default())
}

pub fn decode_with(raw: &str, english: &str, limits: &HeuristicLimits) -> Vec<LearningBlock> {
    if let Some(tail) = locate_blocks(raw) {
        if tail.is_none_marker() {
            tracing::debug!("completion declares no learning blocks");
            return Vec::new();
        }
        let blocks = parse_blocks_payload(tail.payload);
        if !blocks.is_empty() {
            tracing::debug!(count = blocks.len(), format = ?tail.format, "decoded structured blocks");
            return blocks;
        }
        tracing::debug!(format = ?tail.format, "blocks section yielded nothing, scanning body");
    }
    let blocks = heuristics::extract_blocks(english, limits);
    tracing::debug!(count = blocks.len(), "heuristic blocks");
    blocks
}

/// Parses the text inside `BLOCKS: [...]`.
pub fn parse_blocks_payload(payload: &str) -> Vec<LearningBlock> {
    let payload = payload.trim();
    if payload.is_empty() || payload.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let tags: Vec<_> = TYPE_TAG_RE.captures_iter(payload).collect();
    if tags.is_empty() {
        tracing::warn!("blocks section has no recognisable [TYPE] tag; discarding");
        return Vec::new();
    }

    let mut blocks = Vec::with_capacity(tags.len());
    for (idx, caps) in tags.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(block_type) = BlockType::from_tag(name.as_str()) else {
            continue;
        };
        let end = tags
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(payload.len(), |m| m.start());
        match decode_segment(block_type, &payload[whole.end()..end]) {
            Some(block) => blocks.push(block),
            None => tracing::warn!(tag = name.as_str(), "discarding empty learning block"),
        }
    }
    blocks
}

/// Decodes the text following one `[TYPE]` tag. The rest of the tag's line is the title.
fn decode_segment(block_type: BlockType, segment: &str) -> Option<LearningBlock> {
    let mut lines = segment.lines();
    let title = lines
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches(&[':', '-'][..])
        .trim()
        .to_string();

    let mut english = String::new();
    let mut hebrew = String::new();
    let mut examples = Vec::new();

    for line in lines {
        let Some((marker, value)) = FieldMarker::split_line(line.trim()) else {
            continue;
        };
        match marker {
            FieldMarker::English => english = value.to_string(),
            FieldMarker::Hebrew => hebrew = value.to_string(),
            FieldMarker::Example => examples.push(match value.split_once('|') {
                Some((en, he)) => BilingualText::new(en.trim(), he.trim()),
                None => BilingualText::new(value, ""),
            }),
        }
    }

    if english.is_empty() && title.is_empty() {
        return None;
    }
    let title = if title.is_empty() {
        block_type.display_name().to_string()
    } else {
        title
    };
    Some(LearningBlock::new(block_type, title, english, hebrew).with_examples(examples))
}
