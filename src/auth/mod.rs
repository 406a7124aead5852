//! Authentication and the current-identity feed

mod session;
mod types;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Supplies the signed-in identity and publishes every change to it.
pub trait IdentityProvider: Send + Sync {
    /// Receiver that sees the current state and every later change
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    fn current_identity(&self) -> Option<Identity>;
}

/// Client for Supabase Authentication.
///
/// Cloning is cheap; clones share the session and the state channel.
#[derive(Clone)]
pub struct Auth {
    config: Arc<Config>,
    client: Client,
    session: Arc<Mutex<Option<Session>>>,
    state: Arc<watch::Sender<AuthState>>,
}

#[derive(Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

fn auth_error(status: StatusCode, text: String) -> Error {
    let message = serde_json::from_str::<AuthErrorBody>(&text)
        .ok()
        .and_then(|body| body.error_description.or(body.msg).or(body.message))
        .unwrap_or(text);
    Error::auth(format!("{} (Status: {})", message, status))
}

impl Auth {
    /// Create a new Auth client
    pub fn new(config: Arc<Config>, client: Client) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            config,
            client,
            session: Arc::new(Mutex::new(None)),
            state: Arc::new(state),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let url = self.config.endpoint("/auth/v1/signup");

        self.set_loading(true);
        let result = async {
            Fetch::post(&self.client, &url)
                .api_key(&self.config.anon_key)
                .json(&json!({ "email": email, "password": password }))?
                .execute::<Value, _>(auth_error)
                .await
        }
        .await;
        self.set_loading(false);
        let body = result?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            self.set_session(session.clone());
            info!(user_id = %session.user.id, "signed up and signed in");
            return Ok(AuthResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user: User = serde_json::from_value(body.get("user").cloned().unwrap_or(body))?;
        info!(user_id = %user.id, "signed up, confirmation pending");
        Ok(AuthResponse {
            user: Some(user),
            session: None,
        })
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.config.endpoint("/auth/v1/token");

        self.set_loading(true);
        let result = async {
            Fetch::post(&self.client, &url)
                .api_key(&self.config.anon_key)
                .query([("grant_type", "password")])
                .json(&json!({ "email": email, "password": password }))?
                .execute::<Session, _>(auth_error)
                .await
        }
        .await;
        self.set_loading(false);
        let session = result?;

        self.set_session(session.clone());
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<()> {
        let token = self.access_token().ok_or(Error::NoSession)?;
        let url = self.config.endpoint("/auth/v1/logout");

        let response = Fetch::post(&self.client, &url)
            .api_key(&self.config.anon_key)
            .bearer_auth(&token)
            .execute_raw()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "sign out rejected");
            return Err(auth_error(status, text));
        }

        self.clear_session();
        info!("signed out");
        Ok(())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    /// Set the session and publish its identity
    pub fn set_session(&self, session: Session) {
        let identity = Identity::from(&session.user);
        *self.lock_session() = Some(session);
        self.state
            .send_modify(|state| state.identity = Some(identity));
    }

    /// Drop the session locally and publish the absent identity
    pub fn clear_session(&self) {
        *self.lock_session() = None;
        self.state.send_modify(|state| state.identity = None);
    }

    /// Bearer token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.access_token.clone())
    }

    /// Snapshot of the published state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }
}

impl IdentityProvider for Auth {
    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }
}
