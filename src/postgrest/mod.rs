//! Database operations through the PostgREST API

mod filter;
mod query;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::Auth;
use crate::config::Config;
use crate::error::Result;
use crate::remote::RemoteStore;

pub use filter::*;
pub use query::TableQuery;

/// Client for database operations.
///
/// Requests carry the signed-in user's access token so row-level security
/// scopes them; without a session the anon key is sent instead.
#[derive(Clone)]
pub struct PostgrestClient {
    config: Arc<Config>,
    http: Client,
    auth: Auth,
}

impl PostgrestClient {
    pub fn new(config: Arc<Config>, http: Client, auth: Auth) -> Self {
        Self { config, http, auth }
    }

    /// Start a request against a table or view
    pub fn from(&self, table: &str) -> TableQuery<'_> {
        TableQuery::new(self, table)
    }
}

#[async_trait]
impl RemoteStore for PostgrestClient {
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>> {
        self.from(table).filter(filter.clone()).single().await
    }

    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Value>> {
        self.from(table).filter(filter.clone()).execute().await
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>> {
        self.from(table).insert(&rows).await
    }

    async fn upsert(&self, table: &str, row: Value) -> Result<()> {
        self.from(table).upsert(&row).await
    }
}
