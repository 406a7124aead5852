//! Boundaries to the hosted backend
//!
//! The session store and profile service only see these traits. The HTTP
//! implementations live in [`crate::postgrest`] and [`crate::storage`]; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::postgrest::Filter;

/// Row-level access to the database
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch at most one row. A missing row is `Ok(None)`, not an error.
    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>>;

    /// Fetch every matching row. Order is whatever the backend returns.
    async fn select_many(&self, table: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Insert rows and return them as persisted, with server-assigned ids.
    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>>;

    /// Insert or update one row by primary key.
    async fn upsert(&self, table: &str, row: Value) -> Result<()>;
}

/// File uploads to a storage bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` to `bucket/path`. With `upsert == false` an existing
    /// object at the same path is a conflict.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<()>;

    /// Public URL of an object in a public bucket. Makes no request.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
