//! User domain model.
//!
//! The user record cached in the session, profile update inputs, and the
//! client-side password validation that runs before any network call.

use crate::error::{Result, SanaError};
use serde::{Deserialize, Serialize};

/// Minimum accepted length for a new password, in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// A user's profile as returned by the backend and cached in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Backend-assigned user id.
    pub id: i64,
    /// Full display name.
    pub full_name: String,
    /// Email address (also the sign-in identifier).
    pub email: String,
    /// Date of birth (ISO 8601 date).
    pub dob: String,
    /// Self-reported gender.
    pub gender: String,
    /// Nationality.
    pub nationality: String,
    /// Timestamp when the account was created (ISO 8601 format).
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserRecord {
    /// Up to two uppercase initials derived from the full name, for the
    /// avatar badge. Falls back to `"?"` for blank names.
    pub fn initials(&self) -> String {
        let initials: String = self
            .full_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }

    /// Merges the fields of a freshly fetched record into this one.
    ///
    /// The backend returns the whole updated record on profile update, so the
    /// merge is a wholesale replacement keyed on identity.
    pub fn merge(&mut self, updated: UserRecord) {
        *self = updated;
    }
}

/// A partial profile update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

impl ProfileUpdate {
    /// True when no field is set, i.e. submitting would be a no-op.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.dob.is_none()
            && self.gender.is_none()
            && self.nationality.is_none()
    }
}

/// Per-user chat usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStats {
    pub total_chats: u64,
    pub total_messages: u64,
}

/// Validates a password change request locally.
///
/// Checked in order: new/confirm equality, then minimum length. Either
/// failure is a [`SanaError::Validation`] and must be surfaced without any
/// network call.
pub fn validate_password_change(new_password: &str, confirm_password: &str) -> Result<()> {
    if new_password != confirm_password {
        return Err(SanaError::validation("New passwords do not match"));
    }
    if new_password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(SanaError::validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: &str) -> UserRecord {
        UserRecord {
            id: 1,
            full_name: full_name.to_string(),
            email: "a@example.com".to_string(),
            dob: "1990-01-01".to_string(),
            gender: "female".to_string(),
            nationality: "Japanese".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_initials_two_names() {
        assert_eq!(user("Asuna Yuuki").initials(), "AY");
    }

    #[test]
    fn test_initials_single_name() {
        assert_eq!(user("Asuna").initials(), "A");
    }

    #[test]
    fn test_initials_caps_at_two() {
        assert_eq!(user("Anna Maria van Dyk").initials(), "AM");
    }

    #[test]
    fn test_initials_blank_name() {
        assert_eq!(user("   ").initials(), "?");
    }

    #[test]
    fn test_password_mismatch_rejected() {
        let err = validate_password_change("password1", "password2").unwrap_err();
        assert!(err.is_validation());
        assert!(err.user_message().contains("do not match"));
    }

    #[test]
    fn test_password_length_boundary() {
        // 7 characters rejected, 8 accepted.
        let err = validate_password_change("1234567", "1234567").unwrap_err();
        assert!(err.is_validation());
        assert!(validate_password_change("12345678", "12345678").is_ok());
    }

    #[test]
    fn test_mismatch_checked_before_length() {
        let err = validate_password_change("short", "different").unwrap_err();
        assert!(err.user_message().contains("do not match"));
    }
}
