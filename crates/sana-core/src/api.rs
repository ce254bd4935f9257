//! Remote API seam.
//!
//! Defines the contract the controller programs against, decoupling it from
//! the HTTP client. The concrete implementation lives in `sana-interaction`;
//! controller tests substitute a mock.

use crate::chat::{ChatDetail, ChatId, ChatSummary, Message, NewMessage};
use crate::error::Result;
use crate::prediction::PredictionResult;
use crate::user::{ChatStats, ProfileUpdate, UserRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a successful sign-in: the bearer token and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignIn {
    pub token: String,
    pub user: UserRecord,
}

/// Reference details for a disease: description plus recommended precautions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDetails {
    pub disease: String,
    pub description: String,
    pub precautions: Vec<String>,
}

/// The chat/prediction backend, one method per endpoint.
///
/// Every call except `sign_in` carries the stored bearer token; requests made
/// without one are rejected by the backend with 401.
#[async_trait]
pub trait HealthApi: Send + Sync {
    /// Exchanges credentials for a token and user record.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn>;

    /// Lists the caller's chats, most recent first.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>>;

    /// Creates a chat with the given title.
    async fn create_chat(&self, title: &str) -> Result<ChatSummary>;

    /// Fetches a chat and its ordered messages.
    async fn get_chat(&self, id: ChatId) -> Result<ChatDetail>;

    /// Deletes a chat and its messages.
    async fn delete_chat(&self, id: ChatId) -> Result<()>;

    /// Appends a message to a chat.
    async fn append_message(&self, chat_id: ChatId, message: &NewMessage) -> Result<Message>;

    /// Submits a free-text symptom description for prediction.
    async fn predict(&self, user_input: &str) -> Result<PredictionResult>;

    /// Looks up description and precautions for a disease label.
    async fn disease_details(&self, disease: &str) -> Result<DiseaseDetails>;

    /// Fetches the caller's profile.
    async fn profile(&self) -> Result<UserRecord>;

    /// Updates profile fields, returning the updated record.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord>;

    /// Fetches the caller's chat usage counters.
    async fn chat_stats(&self) -> Result<ChatStats>;

    /// Submits a password change (current + new, form-encoded).
    async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()>;
}
