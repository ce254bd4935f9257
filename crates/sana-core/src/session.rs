//! Session model and persistence seam.
//!
//! The session is the client-held proof of authentication plus the cached
//! user identity. It is created on sign-in, read at startup, and cleared on
//! logout.

use crate::error::Result;
use crate::user::UserRecord;
use serde::{Deserialize, Serialize};

/// The client-held session: an opaque bearer token plus the cached user.
///
/// A present token without a valid user record is treated as invalid and
/// forces the logout path (see [`Session::validity`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token issued at sign-in.
    pub token: Option<String>,
    /// Cached user record, refreshed wholesale on profile update.
    pub user: Option<UserRecord>,
}

/// Outcome of inspecting a stored session at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValidity {
    /// Token and user are both present; the client may proceed.
    SignedIn(UserRecord),
    /// No token stored; redirect to sign-in, perform no further work.
    SignedOut,
    /// Token present but the user record is absent or unusable; the session
    /// must be cleared (logout path).
    Corrupt,
}

impl Session {
    /// Creates a signed-in session from sign-in results.
    pub fn signed_in(token: impl Into<String>, user: UserRecord) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    /// Classifies the session, failing closed.
    pub fn validity(&self) -> SessionValidity {
        match (&self.token, &self.user) {
            (Some(_), Some(user)) => SessionValidity::SignedIn(user.clone()),
            (None, _) => SessionValidity::SignedOut,
            (Some(_), None) => SessionValidity::Corrupt,
        }
    }

    /// True when a token is stored.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// An abstract store for the persisted session.
///
/// Decouples the controller from the storage mechanism (a JSON file in the
/// shipped client, an in-memory map in tests).
pub trait SessionStore: Send + Sync {
    /// Loads the stored session. A missing backing file is an empty session,
    /// not an error.
    fn load(&self) -> Result<Session>;

    /// Persists the session, replacing whatever was stored before.
    fn save(&self, session: &Session) -> Result<()>;

    /// Removes all stored session state. After this returns, `load` yields an
    /// empty session and no token is retrievable.
    fn clear(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            id: 1,
            full_name: "Kirito Kirigaya".to_string(),
            email: "kirito@example.com".to_string(),
            dob: "2008-10-07".to_string(),
            gender: "male".to_string(),
            nationality: "Japanese".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_validity_signed_in() {
        let session = Session::signed_in("tok", user());
        assert!(matches!(session.validity(), SessionValidity::SignedIn(u) if u.id == 1));
    }

    #[test]
    fn test_validity_signed_out_without_token() {
        assert_eq!(Session::default().validity(), SessionValidity::SignedOut);

        // Even a cached user without a token is signed out.
        let session = Session {
            token: None,
            user: Some(user()),
        };
        assert_eq!(session.validity(), SessionValidity::SignedOut);
    }

    #[test]
    fn test_validity_token_without_user_is_corrupt() {
        let session = Session {
            token: Some("tok".to_string()),
            user: None,
        };
        assert_eq!(session.validity(), SessionValidity::Corrupt);
    }
}
