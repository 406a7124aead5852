//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::Session;

/// User data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: Uuid,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// The user's role
    #[serde(default)]
    pub role: Option<String>,

    /// The creation time
    #[serde(default)]
    pub created_at: Option<String>,

    /// The update time
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The signed-in identity every query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// What the identity provider publishes to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Absent until a user is signed in
    pub identity: Option<Identity>,

    /// True while a sign-in or sign-up request is in flight
    pub loading: bool,
}

/// Result of a sign-up.
///
/// When email confirmation is enabled the server returns the user without
/// a session, and nobody is signed in yet.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}
