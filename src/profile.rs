//! Persisting profile edits and profile pictures

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::models::Profile;
use crate::remote::{ObjectStore, RemoteStore};
use crate::storage::content_type_for;
use crate::store::SessionStore;

/// Writes profile changes to the backend, then mirrors them into the
/// [`SessionStore`] so readers see them without a refresh.
#[derive(Clone)]
pub struct ProfileService {
    store: SessionStore,
    remote: Arc<dyn RemoteStore>,
    objects: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    bucket: String,
    table: String,
}

/// Object path for a user's picture: `{user_id}-{unix_millis}.{ext}`.
///
/// The extension is whatever follows the last `.`, or the whole name when
/// there is none.
pub fn avatar_path(user_id: uuid::Uuid, unix_millis: i64, file_name: &str) -> String {
    let extension = file_name.rsplit('.').next().unwrap_or(file_name);
    format!("{}-{}.{}", user_id, unix_millis, extension)
}

impl ProfileService {
    pub fn new(
        store: SessionStore,
        remote: Arc<dyn RemoteStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let options = ClientOptions::default();
        Self {
            store,
            remote,
            objects,
            clock: Arc::new(SystemClock),
            bucket: options.avatar_bucket,
            table: options.profiles_table,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use the bucket and table names from `options`
    pub fn with_options(mut self, options: &ClientOptions) -> Self {
        self.bucket = options.avatar_bucket.clone();
        self.table = options.profiles_table.clone();
        self
    }

    /// Save the username and daily goal.
    pub async fn save_profile(&self, username: &str, calorie_goal: u32) -> Result<Profile> {
        let user_id = self.store.user_id().ok_or(Error::NoSession)?;

        let row = json!({
            "id": user_id,
            "username": username,
            "calorie_goal": calorie_goal,
            "updated_at": self.clock.now(),
        });
        if let Err(e) = self.remote.upsert(&self.table, row).await {
            error!(error = %e, %user_id, "Error updating profile");
            return Err(e);
        }

        info!(%user_id, username, calorie_goal, "profile saved");
        self.store.patch_profile_locally(
            Profile::default()
                .with_username(username)
                .with_calorie_goal(calorie_goal),
        )
    }

    /// Upload a new profile picture and point the profile at it.
    ///
    /// Returns the picture's public URL.
    pub async fn upload_avatar(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("You must select an image to upload."));
        }
        let user_id = self.store.user_id().ok_or(Error::NoSession)?;

        let now = self.clock.now();
        let path = avatar_path(user_id, now.timestamp_millis(), file_name);
        let extension = path.rsplit('.').next().unwrap_or_default();

        self.objects
            .upload(&self.bucket, &path, bytes, content_type_for(extension), false)
            .await
            .map_err(|e| {
                error!(error = %e, %path, "Error uploading avatar");
                e
            })?;

        let url = self.objects.public_url(&self.bucket, &path);
        let row = json!({ "id": user_id, "avatar_url": url, "updated_at": now });
        if let Err(e) = self.remote.upsert(&self.table, row).await {
            error!(error = %e, %user_id, "Error updating avatar url");
            return Err(e);
        }

        info!(%user_id, %path, "avatar uploaded");
        self.store
            .patch_profile_locally(Profile::default().with_avatar_url(url.clone()))?;
        Ok(url)
    }

    /// Name to greet the user with: the username, else the account email.
    pub fn display_name(&self, email: Option<&str>) -> Option<String> {
        self.store
            .profile()
            .and_then(|p| p.username)
            .filter(|name| !name.is_empty())
            .or_else(|| email.map(str::to_string))
    }
}
