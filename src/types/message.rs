//! Conversation input: messages, system prompt, and the input envelope.

use super::content::ContentBlock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn with_content(role: MessageRole, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn push(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    pub fn contains_image(&self) -> bool {
        self.content.iter().any(|b| {
            matches!(
                b,
                ContentBlock::ImageBase64(_) | ContentBlock::ImageUrl(_)
            )
        })
    }

    /// Concatenation of the literal text blocks.
    pub fn text(&self) -> String {
        self.content.iter().filter_map(ContentBlock::as_text).collect()
    }
}

/// Message role. System content travels separately in [`InferenceInput::system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// System prompt: plain text, or arguments for the function's system template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum System {
    Text(String),
    Arguments(Map<String, Value>),
}

impl From<&str> for System {
    fn from(s: &str) -> Self {
        System::Text(s.to_string())
    }
}

impl From<String> for System {
    fn from(s: String) -> Self {
        System::Text(s)
    }
}

impl From<Map<String, Value>> for System {
    fn from(args: Map<String, Value>) -> Self {
        System::Arguments(args)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<System>,
}

impl InferenceInput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<System>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}
