//! Storage operations for file uploads

mod types;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use crate::auth::Auth;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::remote::ObjectStore;

pub use types::*;

/// Client for Supabase Storage
#[derive(Clone)]
pub struct StorageClient {
    config: Arc<Config>,
    http: Client,
    auth: Auth,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    storage: &'a StorageClient,
    bucket_id: String,
}

impl StorageClient {
    pub fn new(config: Arc<Config>, http: Client, auth: Auth) -> Self {
        Self { config, http, auth }
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient<'_> {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl BucketClient<'_> {
    /// Upload bytes to `path` inside the bucket
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: FileOptions,
    ) -> Result<UploadResponse> {
        let config = &self.storage.config;
        let url = config.endpoint(&format!("/storage/v1/object/{}/{}", self.bucket_id, path));
        let token = self
            .storage
            .auth
            .access_token()
            .unwrap_or_else(|| config.anon_key.clone());

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("", part);

        debug!(bucket = %self.bucket_id, path, "uploading object");

        Fetch::post(&self.storage.http, &url)
            .api_key(&config.anon_key)
            .bearer_auth(&token)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .multipart(form)
            .execute::<UploadResponse, _>(|status, text| {
                Error::storage(format!("{} (Status: {})", text, status))
            })
            .await
    }

    /// Public URL of an object; the bucket must be public for it to resolve
    pub fn get_public_url(&self, path: &str) -> String {
        self.storage.config.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket_id, path
        ))
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<()> {
        let options = FileOptions::new()
            .with_content_type(content_type)
            .with_upsert(upsert);
        self.from(bucket).upload(path, bytes, options).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.from(bucket).get_public_url(path)
    }
}
