//! Session management for authentication

use serde::{Deserialize, Serialize};

use super::types::User;

/// Session data as returned by the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    #[serde(default)]
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    #[serde(default)]
    pub expires_in: i64,

    /// The expiry timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// The signed-in user
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Create a new session expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: String, user: User, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(chrono::Utc::now().timestamp() + expires_in),
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: Some("a@example.com".to_string()),
            phone: None,
            role: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn new_session_expires_relative_to_now() {
        let before = chrono::Utc::now().timestamp();
        let session = Session::new("at".into(), "rt".into(), user(), 3600);
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at >= before + 3600);
        assert!(expires_at <= chrono::Utc::now().timestamp() + 3600);
        assert_eq!(session.token_type, "bearer");
    }

    #[test]
    fn token_response_without_optional_fields_deserializes() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "user": { "id": Uuid::new_v4() }
        }))
        .unwrap();
        assert_eq!(session.token_type, "bearer");
        assert!(session.expires_at.is_none());
        assert!(session.refresh_token.is_empty());
    }
}
