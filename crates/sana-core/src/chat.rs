//! Chat domain model.
//!
//! Types for chat threads and their messages, plus the small pure helpers
//! the controller uses when creating and displaying chats.

use crate::prediction::PredictionResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a chat thread, as assigned by the backend.
pub type ChatId = i64;

/// Maximum number of characters of the first message used as a chat title.
pub const TITLE_MAX_CHARS: usize = 50;

/// Canned greeting shown for a fresh (or empty) chat.
pub const GREETING: &str = "Hello! I'm the Sana health assistant. Describe your symptoms, and I'll help predict potential conditions and provide recommendations.\nFor example: \"I have fever, cough, and headache\"";

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

/// A single persisted message in a chat, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend-assigned message id.
    pub id: i64,
    /// The chat this message belongs to.
    pub chat_id: ChatId,
    /// The authoring user, absent for assistant messages.
    pub user_id: Option<i64>,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message. Assistant messages may hold a serialized
    /// prediction payload.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub created_at: String,
}

/// A message about to be appended to a chat.
///
/// Carries a client-generated id so that a retry after a partial failure can
/// be recognized by the backend instead of duplicating the entry.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    /// Client-generated idempotency key for this append.
    pub client_id: Uuid,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl NewMessage {
    /// Creates a new message with a fresh client id.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            role,
            content: content.into(),
        }
    }
}

/// A chat thread summary as listed in the sidebar history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Backend-assigned chat id.
    pub id: ChatId,
    /// Owning user id.
    pub user_id: i64,
    /// Human-readable chat title, absent for untitled chats.
    pub title: Option<String>,
    /// Timestamp when the chat was created (ISO 8601 format).
    pub created_at: String,
}

impl ChatSummary {
    /// The title to display, falling back to a default for untitled chats.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("New chat")
    }
}

/// A chat thread together with its ordered messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatDetail {
    /// The chat summary.
    pub chat: ChatSummary,
    /// Messages in the order returned by the backend.
    pub messages: Vec<Message>,
}

/// A message in display form.
///
/// Stored assistant content that parses as a prediction payload is carried
/// structurally so the view can render it formatted instead of as raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayMessage {
    /// Plain text from either side of the conversation.
    Text {
        role: MessageRole,
        content: String,
    },
    /// A structured prediction result, always assistant-authored.
    Prediction(PredictionResult),
}

impl DisplayMessage {
    /// Shorthand for a user text message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::Text {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Shorthand for an assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Text {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Converts a persisted message into display form.
    ///
    /// Assistant content is probed for a serialized prediction; anything that
    /// does not parse stays plain text.
    pub fn from_stored(message: &Message) -> Self {
        if message.role == MessageRole::Assistant {
            if let Ok(prediction) = serde_json::from_str::<PredictionResult>(&message.content) {
                return Self::Prediction(prediction);
            }
        }
        Self::Text {
            role: message.role,
            content: message.content.clone(),
        }
    }

    /// The role of the message author.
    pub fn role(&self) -> MessageRole {
        match self {
            Self::Text { role, .. } => *role,
            Self::Prediction(_) => MessageRole::Assistant,
        }
    }
}

/// Derives a chat title from the first message of a draft chat.
///
/// Messages longer than [`TITLE_MAX_CHARS`] characters are truncated and
/// suffixed with an ellipsis; shorter messages are used unchanged.
pub fn chat_title_from(message: &str) -> String {
    if message.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_short_message_unchanged() {
        assert_eq!(chat_title_from("I have a fever"), "I have a fever");
    }

    #[test]
    fn test_title_exactly_fifty_chars_unchanged() {
        let message = "a".repeat(50);
        assert_eq!(chat_title_from(&message), message);
    }

    #[test]
    fn test_title_long_message_truncated_with_ellipsis() {
        let message = "a".repeat(60);
        let title = chat_title_from(&message);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        // 51 multi-byte characters must still truncate at 50 characters.
        let message = "é".repeat(51);
        let title = chat_title_from(&message);
        assert_eq!(title, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageRole::User).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_from_stored_parses_serialized_prediction() {
        let prediction = PredictionResult {
            user_input: None,
            predicted_disease: "Flu".to_string(),
            probability: Some(0.87),
            matched_symptoms: vec!["fever".to_string()],
            precautions: None,
        };
        let message = Message {
            id: 1,
            chat_id: 1,
            user_id: None,
            role: MessageRole::Assistant,
            content: serde_json::to_string(&prediction).unwrap(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        match DisplayMessage::from_stored(&message) {
            DisplayMessage::Prediction(parsed) => {
                assert_eq!(parsed.predicted_disease, "Flu");
            }
            other => panic!("Expected prediction, got {:?}", other),
        }
    }

    #[test]
    fn test_from_stored_keeps_plain_text() {
        let message = Message {
            id: 2,
            chat_id: 1,
            user_id: Some(7),
            role: MessageRole::User,
            content: "I have a headache".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        match DisplayMessage::from_stored(&message) {
            DisplayMessage::Text { role, content } => {
                assert_eq!(role, MessageRole::User);
                assert_eq!(content, "I have a headache");
            }
            other => panic!("Expected text, got {:?}", other),
        }
    }
}
