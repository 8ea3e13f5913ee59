use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// English body and Hebrew summary of one completion, already stripped of
/// structural markup and ready for display.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSections {
    pub english: String,
    pub hebrew: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Grammar,
    Usage,
    Warning,
    Practice,
}

impl BlockType {
    /// Maps an upstream tag name (`GRAMMAR`, `usage`, ...) to a block type.
    /// `VOCABULARY` is an older alias of `USAGE`.
    pub fn from_tag(tag: &str) -> Option<BlockType> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "grammar" => Some(BlockType::Grammar),
            "usage" | "vocabulary" => Some(BlockType::Usage),
            "warning" => Some(BlockType::Warning),
            "practice" => Some(BlockType::Practice),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BlockType::Grammar => "Grammar",
            BlockType::Usage => "Usage",
            BlockType::Warning => "Warning",
            BlockType::Practice => "Practice",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BilingualText {
    pub english: String,
    #[serde(default)]
    pub hebrew: String,
}

impl BilingualText {
    pub fn new(english: impl Into<String>, hebrew: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            hebrew: hebrew.into(),
        }
    }
}

/// A typed annotation card attached to an assistant message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LearningBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub title: String,
    pub content: BilingualText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<BilingualText>,
}

impl LearningBlock {
    /// Builds a block, falling back to the title when there is no body text
    /// so that `content.english` is never empty.
    pub fn new(
        block_type: BlockType,
        title: impl Into<String>,
        english: impl Into<String>,
        hebrew: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let mut english = english.into();
        if english.trim().is_empty() {
            english = title.clone();
        }
        Self {
            block_type,
            title,
            content: BilingualText::new(english, hebrew),
            examples: Vec::new(),
        }
    }

    pub fn with_examples(mut self, examples: Vec<BilingualText>) -> Self {
        self.examples = examples;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Grammar,
    Vocabulary,
    Pronunciation,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackItem {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: BilingualText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// One turn's message as stored in a conversation session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: Sender,
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hebrew: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub learning_blocks: Vec<LearningBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<FeedbackItem>>,
}

impl ChatMessage {
    pub fn user(english: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            english: english.into(),
            hebrew: None,
            timestamp: Utc::now(),
            learning_blocks: Vec::new(),
            feedback: None,
        }
    }

    pub fn assistant(sections: ParsedSections, learning_blocks: Vec<LearningBlock>) -> Self {
        let ParsedSections { english, hebrew } = sections;
        Self {
            sender: Sender::Assistant,
            english,
            hebrew: if hebrew.is_empty() { None } else { Some(hebrew) },
            timestamp: Utc::now(),
            learning_blocks,
            feedback: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}
