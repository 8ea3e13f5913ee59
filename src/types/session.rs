use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::chat::{BilingualText, ChatMessage};

/// Self-assessed proficiency per skill, 1 (beginner) and up.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLevel {
    pub speaking: u8,
    pub writing: u8,
    pub grammar: u8,
    pub vocabulary: u8,
}

impl Default for UserLevel {
    fn default() -> Self {
        Self {
            speaking: 1,
            writing: 1,
            grammar: 1,
            vocabulary: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub english: String,
    pub hebrew: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationStage {
    Assessment,
    TopicSelection,
    #[default]
    Conversation,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SkillScore {
    pub score: f32,
    #[serde(flatten)]
    pub detail: BTreeMap<String, f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ProgressMetrics {
    pub speaking: SkillScore,
    pub writing: SkillScore,
    pub grammar: SkillScore,
    pub vocabulary: SkillScore,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FocusArea {
    pub priority: u8,
    pub description: BilingualText,
    pub status: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub metrics: ProgressMetrics,
    #[serde(default)]
    pub focus_areas: Vec<FocusArea>,
}

/// A stored conversation. The parser only produces the `ChatMessage`s
/// appended to `chat_messages`; everything else belongs to the session store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    pub id: String,
    pub user_level: UserLevel,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub current_topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_progress_update: Option<ProgressSnapshot>,
    #[serde(default)]
    pub current_stage: ConversationStage,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl ConversationSession {
    pub fn new(id: impl Into<String>, user_level: UserLevel) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_level,
            chat_messages: Vec::new(),
            current_topic: None,
            conversation_mode: None,
            last_progress_update: None,
            current_stage: ConversationStage::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.chat_messages.push(message);
    }

    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.chat_messages.len(),
            topic_name: self.current_topic.as_ref().map(|t| t.english.clone()),
            user_level: self.user_level,
        }
    }
}

/// History listing entry; carries no messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    pub user_level: UserLevel,
}
