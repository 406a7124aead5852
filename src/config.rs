//! Configuration for the CalorieTrack client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Connection settings for the Supabase project backing the tracker.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: Url,

    /// Anonymous API key
    pub anon_key: String,

    /// Client options
    pub options: ClientOptions,
}

impl Config {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            options: ClientOptions::default(),
        })
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY`, plus the optional
    /// `CALORIE_TRACK_AVATAR_BUCKET` override.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;

        let mut config = Self::new(&url_str, &anon_key)?;
        if let Ok(bucket) = std::env::var("CALORIE_TRACK_AVATAR_BUCKET") {
            config.options = config.options.with_avatar_bucket(&bucket);
        }
        Ok(config)
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Absolute URL for a service path such as `/rest/v1/meals`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
    }
}

/// Configuration options for the client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Storage bucket holding profile pictures
    pub avatar_bucket: String,

    /// Table holding one profile row per user
    pub profiles_table: String,

    /// Table holding the user's meals
    pub meals_table: String,

    /// Table holding logged food entries
    pub food_entries_table: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            avatar_bucket: "avatars".to_string(),
            profiles_table: "profiles".to_string(),
            meals_table: "meals".to_string(),
            food_entries_table: "food_entries".to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the avatar bucket
    pub fn with_avatar_bucket(mut self, value: &str) -> Self {
        self.avatar_bucket = value.to_string();
        self
    }

    /// Set the profiles table
    pub fn with_profiles_table(mut self, value: &str) -> Self {
        self.profiles_table = value.to_string();
        self
    }

    /// Set the meals table
    pub fn with_meals_table(mut self, value: &str) -> Self {
        self.meals_table = value.to_string();
        self
    }

    /// Set the food entries table
    pub fn with_food_entries_table(mut self, value: &str) -> Self {
        self.food_entries_table = value.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_valid() {
        let config = Config::new("http://localhost:54321", "anon").unwrap();
        assert_eq!(config.url.as_str(), "http://localhost:54321/");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.options.avatar_bucket, "avatars");
    }

    #[test]
    fn config_new_invalid_url() {
        match Config::new("not a valid url", "anon") {
            Err(Error::Url(_)) => {}
            other => panic!("Expected Url error, got {:?}", other),
        }
    }

    #[test]
    fn config_new_empty_key() {
        match Config::new("http://localhost:54321", "") {
            Err(Error::Config(msg)) => assert!(msg.contains("anon_key cannot be empty")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn endpoint_does_not_double_slashes() {
        let config = Config::new("http://localhost:54321/", "anon").unwrap();
        assert_eq!(
            config.endpoint("/rest/v1/meals"),
            "http://localhost:54321/rest/v1/meals"
        );
    }

    #[test]
    fn options_builders_override_defaults() {
        let options = ClientOptions::default()
            .with_request_timeout(None)
            .with_db_schema("tracker")
            .with_avatar_bucket("pictures")
            .with_profiles_table("people")
            .with_meals_table("meal_groups")
            .with_food_entries_table("entries");

        assert_eq!(options.request_timeout, None);
        assert_eq!(options.db_schema, "tracker");
        assert_eq!(options.avatar_bucket, "pictures");
        assert_eq!(options.profiles_table, "people");
        assert_eq!(options.meals_table, "meal_groups");
        assert_eq!(options.food_entries_table, "entries");
    }
}
