//! CalorieTrack client library
//!
//! Keeps a signed-in user's profile, meals and today's food entries in sync
//! with a Supabase backend and derives the daily calorie totals from them.

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod postgrest;
pub mod profile;
pub mod remote;
pub mod storage;
pub mod store;

use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::auth::Auth;
use crate::config::Config;
use crate::error::Result;
use crate::postgrest::PostgrestClient;
use crate::profile::ProfileService;
use crate::storage::StorageClient;
use crate::store::SessionStore;

/// The main entry point: one HTTP client, one auth session and one store.
pub struct CalorieTrack {
    config: Arc<Config>,
    auth: Auth,
    db: PostgrestClient,
    storage: StorageClient,
    store: SessionStore,
}

impl CalorieTrack {
    /// Create a client for the given project
    ///
    /// # Example
    ///
    /// ```
    /// use calorie_track::{config::Config, CalorieTrack};
    ///
    /// let config = Config::new("https://your-project-url.supabase.co", "your-anon-key").unwrap();
    /// let app = CalorieTrack::new(config).unwrap();
    /// assert!(app.store().meals().is_empty());
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let config = Arc::new(config);

        let auth = Auth::new(config.clone(), http.clone());
        let db = PostgrestClient::new(config.clone(), http.clone(), auth.clone());
        let storage = StorageClient::new(config.clone(), http, auth.clone());
        let store = SessionStore::new(Arc::new(db.clone())).with_options(&config.options);

        Ok(Self {
            config,
            auth,
            db,
            storage,
            store,
        })
    }

    /// Create a client from `SUPABASE_URL` and `SUPABASE_ANON_KEY`
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Direct table access, scoped by the current session's token
    pub fn db(&self) -> &PostgrestClient {
        &self.db
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(
            self.store.clone(),
            Arc::new(self.db.clone()),
            Arc::new(self.storage.clone()),
        )
        .with_options(&self.config.options)
    }

    /// Keep the store in step with sign-ins and sign-outs.
    pub fn bind_store(&self) -> JoinHandle<()> {
        self.store.bind(&self.auth)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Auth, AuthState, Identity, IdentityProvider};
    pub use crate::catalog::{Catalog, SaveReport, Selection};
    pub use crate::config::{ClientOptions, Config};
    pub use crate::error::{Error, Result};
    pub use crate::models::{Food, FoodEntry, Meal, Profile};
    pub use crate::store::{DailySummary, MealSummary, SessionStore};
    pub use crate::CalorieTrack;
}
