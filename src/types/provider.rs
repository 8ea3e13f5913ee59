use serde::{Deserialize, Serialize};

use crate::config::ProviderDefaults;
use crate::types::chat::{ChatMessage, Sender};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Assistant => Role::Assistant,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

/// Body the relay forwards to the model provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<ProviderMessage>,
}

impl ProviderRequest {
    /// Builds the request for one user turn from the prior conversation.
    ///
    /// The UI appends the user's message to the history before sending, so a
    /// trailing history entry identical to `user_text` is dropped to avoid
    /// sending it twice.
    pub fn for_turn(
        system: impl Into<String>,
        history: &[ChatMessage],
        user_text: &str,
        defaults: &ProviderDefaults,
    ) -> Self {
        let mut prior = history;
        if let Some((last, rest)) = history.split_last() {
            if last.english == user_text {
                prior = rest;
            }
        }

        let mut messages: Vec<ProviderMessage> = prior
            .iter()
            .map(|msg| ProviderMessage {
                role: msg.sender.into(),
                content: msg.english.clone(),
            })
            .collect();
        messages.push(ProviderMessage {
            role: Role::User,
            content: user_text.to_string(),
        });

        Self {
            model: defaults.model.clone(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            system: system.into(),
            messages,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
    #[serde(other)]
    Other,
}

/// Provider reply as relayed back to the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub model: String,
}

impl ProviderResponse {
    /// The raw completion: text of the first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}
