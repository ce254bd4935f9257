//! Wire types for the Sana backend.
//!
//! Request bodies are defined here so every payload that crosses the HTTP
//! boundary has an explicit schema; responses deserialize into the core
//! domain types directly where the shapes already match.

use sana_core::chat::MessageRole;
use sana_core::user::{ProfileUpdate, UserRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginIn<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginOut {
    pub access_token: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub token_type: String,
    pub user: UserRecord,
}

/// Body for `POST /chats`.
#[derive(Debug, Serialize)]
pub struct CreateChatIn<'a> {
    pub title: &'a str,
}

/// Body for `POST /chats/{id}/messages`.
///
/// `client_message_id` is a client-generated idempotency key; backends that
/// do not track it simply ignore the field.
#[derive(Debug, Serialize)]
pub struct CreateMessageIn<'a> {
    pub role: MessageRole,
    pub content: &'a str,
    pub client_message_id: Uuid,
}

/// Body for `POST /predict_text`.
#[derive(Debug, Serialize)]
pub struct PredictionIn<'a> {
    pub user_input: &'a str,
}

/// Body for `PUT /user/profile`.
///
/// The backend expects `fullName` in camelCase; the remaining fields are
/// snake_case. Unset fields are omitted so the server leaves them untouched.
#[derive(Debug, Serialize)]
pub struct ProfileUpdateIn<'a> {
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfileUpdateIn<'a> {
    fn from(update: &'a ProfileUpdate) -> Self {
        Self {
            full_name: update.full_name.as_deref(),
            dob: update.dob.as_deref(),
            gender: update.gender.as_deref(),
            nationality: update.nationality.as_deref(),
        }
    }
}

/// Optional error body carried by non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_message_serializes_lowercase_role() {
        let body = CreateMessageIn {
            role: MessageRole::Assistant,
            content: "hello",
            client_message_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"client_message_id\""));
    }

    #[test]
    fn test_profile_update_uses_camel_case_full_name() {
        let update = ProfileUpdate {
            full_name: Some("Asuna Yuuki".to_string()),
            dob: None,
            gender: None,
            nationality: Some("Japanese".to_string()),
        };
        let json = serde_json::to_string(&ProfileUpdateIn::from(&update)).unwrap();
        assert!(json.contains("\"fullName\":\"Asuna Yuuki\""));
        assert!(json.contains("\"nationality\""));
        // Unset fields must be omitted entirely, not sent as null.
        assert!(!json.contains("dob"));
        assert!(!json.contains("gender"));
    }

    #[test]
    fn test_error_body_tolerates_missing_detail() {
        let body: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.detail.is_none());

        let body: ApiErrorBody = serde_json::from_str(r#"{"detail":"Invalid token"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("Invalid token"));
    }

    #[test]
    fn test_login_out_parses_backend_shape() {
        let json = r#"{
            "access_token": "tok-abc",
            "token_type": "bearer",
            "user": {
                "id": 1,
                "full_name": "Asuna Yuuki",
                "email": "asuna@example.com",
                "dob": "2007-09-30",
                "gender": "female",
                "nationality": "Japanese",
                "created_at": "2024-01-01T00:00:00Z"
            }
        }"#;
        let login: LoginOut = serde_json::from_str(json).unwrap();
        assert_eq!(login.access_token, "tok-abc");
        assert_eq!(login.user.full_name, "Asuna Yuuki");
    }
}
