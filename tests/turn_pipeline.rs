use pretty_assertions::assert_eq;
use rstest::rstest;

use tutor_protocol::assembler::{assemble, ErrorClass};
use tutor_protocol::error::{ProviderError, TurnError};
use tutor_protocol::parsing::{decode, render, split};
use tutor_protocol::types::chat::{BilingualText, BlockType, ParsedSections, Sender};

fn sections(english: &str, hebrew: &str) -> ParsedSections {
    ParsedSections {
        english: english.to_string(),
        hebrew: hebrew.to_string(),
    }
}

#[rstest]
#[case("")]
#[case("]")]
#[case("[")]
#[case("English:")]
#[case("English: [")]
#[case("Hebrew: [")]
#[case("BLOCKS: [")]
#[case("BLOCKS: []")]
#[case("English: [x] Hebrew: [y] BLOCKS: [[GRAMMAR]")]
#[case("[WARNING]\nEN:\nHE:\nEX: |")]
#[case("EX: a | b | c\n[PRACTICE]:-")]
#[case("\u{0}\u{fffd}\u{200f}עברית ## ")]
#[case("English: [[[[]]]] Hebrew: [[[]]]")]
fn partial_markers_never_panic(#[case] raw: &str) {
    let parsed = split(raw);
    let _ = decode(raw, &parsed.english);
    let message = assemble::<&str>(Ok(raw));
    assert_eq!(message.sender, Sender::Assistant);
}

#[test]
fn bracketed_sections_split_exactly() {
    assert_eq!(split("English: [A] Hebrew: [B]"), sections("A", "B"));
}

#[test]
fn stray_bracket_stays_in_english() {
    let parsed = split("English: [A] with a ] stray bracket Hebrew: [B]");
    assert_eq!(parsed.hebrew, "B");
    assert!(parsed.english.contains("with a ] stray bracket"));
}

#[test]
fn hebrew_line_without_brackets() {
    assert_eq!(split("A\nHebrew: B"), sections("A", "B"));
}

#[test]
fn unlabelled_text_is_all_english() {
    let raw = "  Great answer! Keep practising your verbs.\n\n";
    assert_eq!(
        split(raw),
        sections("Great answer! Keep practising your verbs.", "")
    );
}

#[test]
fn blocks_none_yields_nothing() {
    let raw = "English: [Try to practice more, and remember the tip.] Hebrew: [נסה] BLOCKS: [none]";
    let parsed = split(raw);
    assert!(decode(raw, &parsed.english).is_empty());
}

#[test]
fn block_fields_are_extracted() {
    let raw = "English: [Hi] Hebrew: [היי] BLOCKS: [\n[GRAMMAR] Subject-verb\nEN: He goes\nHE: הוא הולך\nEX: a | b\n]";
    let blocks = decode(raw, "Hi");
    assert_eq!(blocks.len(), 1);
    let block = &blocks[0];
    assert_eq!(block.block_type, BlockType::Grammar);
    assert_eq!(block.title, "Subject-verb");
    assert_eq!(block.content, BilingualText::new("He goes", "הוא הולך"));
    assert_eq!(block.examples, vec![BilingualText::new("a", "b")]);
}

#[test]
fn vocabulary_tag_is_usage() {
    let raw = "English: [Hi] Hebrew: [היי] BLOCKS: [[VOCABULARY] Borrow vs lend\nEN: borrow from, lend to]";
    let blocks = decode(raw, "Hi");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].block_type, BlockType::Usage);
    assert_eq!(blocks[0].title, "Borrow vs lend");
}

#[test]
fn structured_blocks_suppress_heuristic_scan() {
    let english = "Did you mean \"went\"?\n## Grammar note\nPast simple.\nTry it yourself!";
    let raw = format!(
        "English: [{english}] Hebrew: [x] BLOCKS: [\n[USAGE] Went\nEN: past of go\n]"
    );
    let parsed = split(&raw);
    let blocks = decode(&raw, &parsed.english);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].title, "Went");
}

#[test]
fn plain_text_renders_as_single_paragraph() {
    assert_eq!(
        render("Nothing special in this sentence."),
        "<p>Nothing special in this sentence.</p>"
    );
    assert_eq!(render("Tom & Jerry"), "<p>Tom &amp; Jerry</p>");
}

#[rstest]
#[case("<script>alert(1)</script>")]
#[case("# <script>x</script>")]
#[case("- <script>x</script>")]
#[case("1. <script>x</script>")]
#[case("| <script>x</script> | y |")]
#[case("**<script>x</script>**")]
fn script_is_escaped_everywhere(#[case] input: &str) {
    let html = render(input);
    assert!(!html.contains("<script>"), "{html}");
    assert!(html.contains("&lt;script&gt;"), "{html}");
}

#[rstest]
#[case(429, "rate_limit_error", ErrorClass::RateLimited)]
#[case(0, "unknown_error", ErrorClass::Unreachable)]
#[case(503, "overloaded_error", ErrorClass::ServiceUnavailable)]
#[case(400, "invalid_request_error", ErrorClass::Unprocessable)]
fn provider_failures_map_to_canned_messages(
    #[case] status: u16,
    #[case] kind: &str,
    #[case] class: ErrorClass,
) {
    let err: TurnError = ProviderError::new(status, kind, "upstream said no").into();
    let message = assemble::<&str>(Err(err));
    let canned = class.canned_message();
    assert_eq!(message.sender, Sender::Assistant);
    assert_eq!(message.english, canned.english);
    assert_eq!(message.hebrew, Some(canned.hebrew));
    assert!(message.learning_blocks.is_empty());
}

#[test]
fn missing_text_block_maps_to_rephrase_message() {
    let message = assemble::<&str>(Err(TurnError::NoTextContent));
    assert_eq!(
        message.english,
        ErrorClass::Unprocessable.canned_message().english
    );
}

#[test]
fn corrected_sentence_turn() {
    let raw = "English: [Good job! Did you mean: \"I **went** to the store\"?] Hebrew: [כל הכבוד] BLOCKS: [ [GRAMMAR] Past tense\nEN: Use went, not goed\nHE: יש להשתמש ב-went\n ]";
    let message = assemble::<&str>(Ok(raw));

    assert!(message.english.contains("Did you mean"));
    assert_eq!(message.hebrew.as_deref(), Some("כל הכבוד"));
    assert_eq!(message.learning_blocks.len(), 1);
    let block = &message.learning_blocks[0];
    assert_eq!(block.block_type, BlockType::Grammar);
    assert_eq!(block.title, "Past tense");
    assert_eq!(block.content.english, "Use went, not goed");

    let html = render(message.english.as_str());
    assert!(html.contains("<strong>went</strong>"));
    assert!(html.contains("&quot;"));
}

#[test]
fn tag_line_inside_english_keeps_hebrew_and_adds_no_block() {
    let raw = "English: [Good.\n[PRACTICE] Try this\nKeep going]\nHebrew: [טוב]";
    let message = assemble::<&str>(Ok(raw));
    assert_eq!(message.english, "Good.\nKeep going");
    assert_eq!(message.hebrew.as_deref(), Some("טוב"));
    assert!(message.learning_blocks.is_empty());
}
