//! Query builder for one table

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{ApiErrorDetails, Error, Result};
use crate::fetch::FetchBuilder;
use crate::postgrest::filter::Filter;
use crate::postgrest::PostgrestClient;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const ALL_COLUMNS: &str = "*";

/// Map a PostgREST error body to [`Error::Database`]. Bodies that are not
/// PostgREST JSON keep their raw text as the message.
pub(crate) fn api_error(status: StatusCode, text: String) -> Error {
    let details = serde_json::from_str::<ApiErrorDetails>(&text).unwrap_or(ApiErrorDetails {
        message: Some(text),
        ..Default::default()
    });
    Error::Database { details, status }
}

/// Builder for requests against a single table or view
pub struct TableQuery<'a> {
    client: &'a PostgrestClient,
    table: String,
    filter: Filter,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn new(client: &'a PostgrestClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            filter: Filter::new(),
        }
    }

    /// Restrict the rows the request applies to
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    fn request(&self, method: Method) -> FetchBuilder<'a> {
        let config = &self.client.config;
        let url = config.endpoint(&format!("/rest/v1/{}", self.table));
        let token = self
            .client
            .auth
            .access_token()
            .unwrap_or_else(|| config.anon_key.clone());
        let profile_header = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };

        FetchBuilder::new(&self.client.http, &url, method)
            .api_key(&config.anon_key)
            .bearer_auth(&token)
            .header(profile_header, &config.options.db_schema)
            .query(self.filter.to_query_pairs())
    }

    /// Fetch every matching row
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.request(Method::GET)
            .query([("select", ALL_COLUMNS)])
            .execute::<Vec<T>, _>(api_error)
            .await
    }

    /// Fetch exactly one row; "no rows" is `Ok(None)`
    pub async fn single<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let result = self
            .request(Method::GET)
            .header("Accept", SINGLE_OBJECT)
            .query([("select", ALL_COLUMNS)])
            .execute::<T, _>(api_error)
            .await;

        match result {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert rows and return them as stored
    pub async fn insert<T: Serialize + ?Sized>(&self, rows: &T) -> Result<Vec<Value>> {
        self.request(Method::POST)
            .header("Prefer", "return=representation")
            .query([("select", ALL_COLUMNS)])
            .json(rows)?
            .execute::<Vec<Value>, _>(api_error)
            .await
    }

    /// Insert or merge a row on primary key conflict
    pub async fn upsert<T: Serialize + ?Sized>(&self, row: &T) -> Result<()> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)?
            .execute_raw()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, text));
        }
        Ok(())
    }
}
