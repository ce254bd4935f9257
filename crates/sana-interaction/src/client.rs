//! Reqwest implementation of the [`HealthApi`] seam.
//!
//! Every call except `sign_in` carries the bearer token read from the session
//! store at request time. Non-2xx responses are mapped into
//! [`SanaError::Api`], using the server's `{detail}` body when present and a
//! per-endpoint fallback message otherwise.

use crate::dto::{
    ApiErrorBody, CreateChatIn, CreateMessageIn, LoginIn, LoginOut, PredictionIn, ProfileUpdateIn,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use sana_core::api::{DiseaseDetails, HealthApi, SignIn};
use sana_core::chat::{ChatDetail, ChatId, ChatSummary, Message, NewMessage};
use sana_core::error::{Result, SanaError};
use sana_core::prediction::PredictionResult;
use sana_core::session::SessionStore;
use sana_core::user::{ChatStats, ProfileUpdate, UserRecord};
use sana_infrastructure::ClientConfig;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for the Sana backend.
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    /// Creates a client from explicit parameters.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            store,
        }
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.timeout_secs),
            store,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the timeout and, when a token is stored, the bearer header.
    ///
    /// Mirrors the session-store-per-call convention: a token saved after
    /// sign-in is picked up by the next request without rebuilding the client.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.timeout);
        match self.store.load() {
            Ok(session) => match session.token {
                Some(token) => request.header("Authorization", format!("Bearer {}", token)),
                None => request,
            },
            Err(e) => {
                tracing::warn!("failed to read session for auth header: {}", e);
                request
            }
        }
    }

    /// Decodes a 2xx JSON response, or maps the failure to a typed error.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        fallback: &str,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response, fallback).await);
        }
        response.json::<T>().await.map_err(SanaError::from)
    }

    /// Builds the error for a non-2xx response.
    async fn error_from(response: Response, fallback: &str) -> SanaError {
        let status = response.status().as_u16();
        let detail = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| fallback.to_string());
        SanaError::api(status, detail)
    }
}

#[async_trait]
impl HealthApi for ApiClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .timeout(self.timeout)
            .json(&LoginIn { email, password })
            .send()
            .await?;

        let login: LoginOut = Self::decode(response, "Sign in failed").await?;
        Ok(SignIn {
            token: login.access_token,
            user: login.user,
        })
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let response = self.authorized(self.http.get(self.url("/chats"))).send().await?;
        Self::decode(response, "Failed to load chat history").await
    }

    async fn create_chat(&self, title: &str) -> Result<ChatSummary> {
        let response = self
            .authorized(self.http.post(self.url("/chats")))
            .json(&CreateChatIn { title })
            .send()
            .await?;
        Self::decode(response, "Failed to create chat").await
    }

    async fn get_chat(&self, id: ChatId) -> Result<ChatDetail> {
        let response = self
            .authorized(self.http.get(self.url(&format!("/chats/{}", id))))
            .send()
            .await?;
        Self::decode(response, "Failed to load chat").await
    }

    async fn delete_chat(&self, id: ChatId) -> Result<()> {
        let response = self
            .authorized(self.http.delete(self.url(&format!("/chats/{}", id))))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to delete chat").await);
        }
        Ok(())
    }

    async fn append_message(&self, chat_id: ChatId, message: &NewMessage) -> Result<Message> {
        let response = self
            .authorized(
                self.http
                    .post(self.url(&format!("/chats/{}/messages", chat_id))),
            )
            .json(&CreateMessageIn {
                role: message.role,
                content: &message.content,
                client_message_id: message.client_id,
            })
            .send()
            .await?;
        Self::decode(response, "Failed to save message").await
    }

    async fn predict(&self, user_input: &str) -> Result<PredictionResult> {
        tracing::debug!(chars = user_input.chars().count(), "submitting prediction");
        let response = self
            .authorized(self.http.post(self.url("/predict_text")))
            .json(&PredictionIn { user_input })
            .send()
            .await?;
        Self::decode(response, "Prediction failed").await
    }

    async fn disease_details(&self, disease: &str) -> Result<DiseaseDetails> {
        let response = self
            .authorized(self.http.get(self.url("/get_details")))
            .query(&[("disease", disease)])
            .send()
            .await?;
        Self::decode(response, "Failed to load disease details").await
    }

    async fn profile(&self) -> Result<UserRecord> {
        let response = self
            .authorized(self.http.get(self.url("/user/profile")))
            .send()
            .await?;
        Self::decode(response, "Failed to load profile").await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord> {
        let response = self
            .authorized(self.http.put(self.url("/user/profile")))
            .json(&ProfileUpdateIn::from(update))
            .send()
            .await?;
        Self::decode(response, "Update failed").await
    }

    async fn chat_stats(&self) -> Result<ChatStats> {
        let response = self
            .authorized(self.http.get(self.url("/user/chat-stats")))
            .send()
            .await?;
        Self::decode(response, "Failed to load chat stats").await
    }

    async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        // The backend takes this one form-encoded, not as JSON.
        let response = self
            .authorized(self.http.post(self.url("/user/change-password")))
            .form(&[
                ("current_password", current_password),
                ("new_password", new_password),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, "Password change failed").await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sana_core::session::Session;
    use std::sync::Mutex;

    struct MemoryStore {
        session: Mutex<Session>,
    }

    impl SessionStore for MemoryStore {
        fn load(&self) -> Result<Session> {
            Ok(self.session.lock().unwrap().clone())
        }

        fn save(&self, session: &Session) -> Result<()> {
            *self.session.lock().unwrap() = session.clone();
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.session.lock().unwrap() = Session::default();
            Ok(())
        }
    }

    fn response(status: u16, body: &'static str) -> Response {
        Response::from(
            http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_error_from_surfaces_detail_body() {
        let rejected = response(422, r#"{"detail":"Input too long (max 2000 characters)"}"#);
        let err = ApiClient::error_from(rejected, "Prediction failed").await;
        assert!(matches!(err, SanaError::Api { status: 422, .. }));
        assert_eq!(err.user_message(), "Input too long (max 2000 characters)");
    }

    #[tokio::test]
    async fn test_error_from_falls_back_without_detail() {
        let err = ApiClient::error_from(response(500, "{}"), "Failed to load chat").await;
        assert!(matches!(err, SanaError::Api { status: 500, .. }));
        assert_eq!(err.user_message(), "Failed to load chat");
    }

    #[tokio::test]
    async fn test_error_from_falls_back_on_unparseable_body() {
        let err = ApiClient::error_from(response(502, "<html>bad gateway</html>"), "Sign in failed").await;
        assert!(matches!(err, SanaError::Api { status: 502, .. }));
        assert_eq!(err.user_message(), "Sign in failed");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let store = Arc::new(MemoryStore {
            session: Mutex::new(Session::default()),
        });
        let client = ApiClient::new(
            "http://localhost:8000/",
            Duration::from_secs(5),
            store,
        );
        assert_eq!(client.url("/chats"), "http://localhost:8000/chats");
        assert_eq!(client.url("/chats/7"), "http://localhost:8000/chats/7");
    }
}
