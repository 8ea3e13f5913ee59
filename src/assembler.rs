//! Turns one provider round trip into a displayable `ChatMessage`.
//!
//! Nothing here returns an error: malformed text degrades through the parsing
//! fallbacks, and failed calls become one of four canned bilingual replies.

use serde::Serialize;

use crate::config::HeuristicLimits;
use crate::error::{ProviderError, TurnError};
use crate::parsing::{blocks, sections};
use crate::types::chat::{BilingualText, ChatMessage, ParsedSections};
use crate::types::provider::ProviderResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    RateLimited,
    Unreachable,
    ServiceUnavailable,
    Unprocessable,
}

impl ErrorClass {
    pub fn from_provider(err: &ProviderError) -> ErrorClass {
        if err.status == 429 {
            ErrorClass::RateLimited
        } else if err.status == 0 || err.kind == "unknown_error" {
            ErrorClass::Unreachable
        } else if err.status >= 500 {
            ErrorClass::ServiceUnavailable
        } else {
            ErrorClass::Unprocessable
        }
    }

    pub fn classify(err: &TurnError) -> ErrorClass {
        match err {
            TurnError::Provider(provider) => ErrorClass::from_provider(provider),
            TurnError::NoTextContent | TurnError::InvalidPayload(_) => ErrorClass::Unprocessable,
        }
    }

    /// Whether resending the same turn later might succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::RateLimited | ErrorClass::ServiceUnavailable)
    }

    pub fn canned_message(self) -> BilingualText {
        match self {
            ErrorClass::RateLimited => BilingualText::new(
                "I'm receiving too many requests right now. Please wait a moment and try again.",
                "יש יותר מדי בקשות כרגע. אנא המתן רגע ונסה שוב.",
            ),
            ErrorClass::Unreachable => BilingualText::new(
                "I can't reach the server. Please check your internet connection and make sure the backend is running.",
                "לא ניתן להתחבר לשרת. אנא בדוק את חיבור האינטרנט ושהשרת פועל.",
            ),
            ErrorClass::ServiceUnavailable => BilingualText::new(
                "The AI service is temporarily unavailable. Please try again in a few moments.",
                "שירות ה-AI לא זמין זמנית. אנא נסה שוב בעוד מספר רגעים.",
            ),
            ErrorClass::Unprocessable => BilingualText::new(
                "I'm having difficulty processing that. Could you please rephrase?",
                "אני מתקשה לעבד את זה. האם תוכל לנסח מחדש?",
            ),
        }
    }
}

pub fn assemble<S: AsRef<str>>(completion: Result<S, TurnError>) -> ChatMessage {
    assemble_with(completion, &HeuristicLimits::default())
}

pub fn assemble_with<S: AsRef<str>>(
    completion: Result<S, TurnError>,
    limits: &HeuristicLimits,
) -> ChatMessage {
    match completion {
        Ok(raw) => assemble_text(raw.as_ref(), limits),
        Err(err) => error_message(&err),
    }
}

/// Same as [`assemble_with`], starting from the provider's structured reply.
pub fn assemble_response(
    response: Result<ProviderResponse, TurnError>,
    limits: &HeuristicLimits,
) -> ChatMessage {
    let completion = response.and_then(|resp| {
        resp.first_text()
            .map(str::to_owned)
            .ok_or(TurnError::NoTextContent)
    });
    assemble_with(completion, limits)
}

fn assemble_text(raw: &str, limits: &HeuristicLimits) -> ChatMessage {
    let parsed = sections::split(raw);
    let learning_blocks = blocks::decode_with(raw, &parsed.english, limits);
    tracing::debug!(blocks = learning_blocks.len(), "assembled assistant message");
    ChatMessage::assistant(parsed, learning_blocks)
}

/// The canned assistant reply for a failed turn.
pub fn error_message(err: &TurnError) -> ChatMessage {
    let class = ErrorClass::classify(err);
    tracing::warn!(?class, retryable = class.is_retryable(), "turn failed: {}", err);
    let BilingualText { english, hebrew } = class.canned_message();
    ChatMessage::assistant(ParsedSections { english, hebrew }, Vec::new())
}

/// Interprets a relay reply given its HTTP status and body.
///
/// Non-2xx statuses become a `ProviderError`, reading `type` and `error`/`message`
/// from the body when it is JSON.
pub fn decode_relay_reply(status: u16, body: &str) -> Result<ProviderResponse, TurnError> {
    if (200..300).contains(&status) {
        return Ok(serde_json::from_str(body)?);
    }
    let mut err = serde_json::from_str::<ProviderError>(body)
        .unwrap_or_else(|_| ProviderError::new(status, "server_error", body.trim()));
    err.status = status;
    Err(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chat::{BlockType, Sender};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(429, "rate_limit_error", ErrorClass::RateLimited)]
    #[case(0, "", ErrorClass::Unreachable)]
    #[case(400, "unknown_error", ErrorClass::Unreachable)]
    #[case(500, "api_error", ErrorClass::ServiceUnavailable)]
    #[case(503, "overloaded_error", ErrorClass::ServiceUnavailable)]
    #[case(400, "invalid_request_error", ErrorClass::Unprocessable)]
    #[case(404, "not_found_error", ErrorClass::Unprocessable)]
    fn classifies_provider_errors(
        #[case] status: u16,
        #[case] kind: &str,
        #[case] expected: ErrorClass,
    ) {
        let err = ProviderError::new(status, kind, "boom");
        assert_eq!(ErrorClass::from_provider(&err), expected);
    }

    #[test]
    fn only_rate_limit_and_outage_are_retryable() {
        assert!(ErrorClass::RateLimited.is_retryable());
        assert!(ErrorClass::ServiceUnavailable.is_retryable());
        assert!(!ErrorClass::Unreachable.is_retryable());
        assert!(!ErrorClass::Unprocessable.is_retryable());
    }

    #[test]
    fn error_turn_becomes_canned_assistant_message() {
        let msg = assemble::<&str>(Err(ProviderError::new(429, "rate_limit_error", "slow down").into()));
        assert_eq!(msg.sender, Sender::Assistant);
        assert_eq!(msg.english, ErrorClass::RateLimited.canned_message().english);
        assert_eq!(msg.hebrew, Some(ErrorClass::RateLimited.canned_message().hebrew));
        assert!(msg.learning_blocks.is_empty());
    }

    #[test]
    fn response_without_text_is_unprocessable() {
        let response = ProviderResponse {
            content: Vec::new(),
            role: "assistant".to_string(),
            model: "m".to_string(),
        };
        let msg = assemble_response(Ok(response), &HeuristicLimits::default());
        assert_eq!(msg.english, ErrorClass::Unprocessable.canned_message().english);
    }

    #[test]
    fn successful_turn_is_parsed() {
        let raw = "English: [Great!] Hebrew: [מצוין] BLOCKS: [\n[PRACTICE] Describe your weekend\nEN: Use the past simple\n]";
        let msg = assemble::<&str>(Ok(raw));
        assert_eq!(msg.english, "Great!");
        assert_eq!(msg.hebrew.as_deref(), Some("מצוין"));
        assert_eq!(msg.learning_blocks.len(), 1);
        assert_eq!(msg.learning_blocks[0].block_type, BlockType::Practice);
    }

    #[test]
    fn relay_error_body_keeps_http_status() {
        let err = decode_relay_reply(503, r#"{"error": "Overloaded", "type": "overloaded_error"}"#)
            .unwrap_err();
        match err {
            TurnError::Provider(provider) => {
                assert_eq!(provider.status, 503);
                assert_eq!(provider.kind, "overloaded_error");
                assert_eq!(provider.message, "Overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn relay_plain_text_error_is_wrapped() {
        let err = decode_relay_reply(502, "Bad Gateway").unwrap_err();
        assert_eq!(ErrorClass::classify(&err), ErrorClass::ServiceUnavailable);
    }

    #[test]
    fn relay_success_with_garbage_body_is_invalid_payload() {
        let err = decode_relay_reply(200, "<html>").unwrap_err();
        assert!(matches!(err, TurnError::InvalidPayload(_)));
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Unprocessable);
    }
}
