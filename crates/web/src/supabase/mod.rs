//! Supabase REST and auth client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against PostgREST (`/rest/v1`) and `GoTrue` (`/auth/v1`)
//! - Supabase is the source of truth - no local copy of listings or users
//! - Single-listing lookups are cached via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use rentswipe_web::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//!
//! // One page of listings under the visitor's filters
//! let listings = client.fetch_rentals(&ListingQuery::for_filters(&filters, 0)).await?;
//!
//! // Sign in
//! let session = client.sign_in(&email, &password).await?;
//! ```

mod auth;
mod conversions;
mod rest;
pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use rentswipe_core::{Listing, ListingId};

use crate::config::SupabaseConfig;

/// Postgres unique-violation code, returned when a favorite already exists.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase answered with an error status.
    #[error("API error: {status} {}: {message}", .code.as_deref().unwrap_or("-"))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Supabase.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client could not be configured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SupabaseError {
    /// The machine-readable error code, if Supabase sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Client for one Supabase project.
///
/// Cheap to clone; all clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    listings: Cache<ListingId, Listing>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| SupabaseError::Config(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        let listings = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                listings,
            }),
        })
    }

    /// Resolve a path relative to the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Bearer token for calls made without a signed-in user.
    fn anon_bearer(&self) -> &str {
        self.inner.anon_key.expose_secret()
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    fn listing_cache(&self) -> &Cache<ListingId, Listing> {
        &self.inner.listings
    }
}

// =============================================================================
// Response handling
// =============================================================================

/// Read a response body, turning error statuses into [`SupabaseError`].
async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), SupabaseError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(SupabaseError::RateLimited(retry_after));
    }

    let body = response.text().await?;
    Ok((status, body))
}

/// Decode a successful JSON body, or the error body of a failed call.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SupabaseError> {
    let (status, body) = read_body(response).await?;

    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse Supabase response"
        );
        SupabaseError::Parse(e)
    })
}

/// Expect an empty success, e.g. `204 No Content`.
async fn expect_success(response: reqwest::Response) -> Result<(), SupabaseError> {
    let (status, body) = read_body(response).await?;
    if status.is_success() {
        Ok(())
    } else {
        Err(api_error(status, &body))
    }
}

/// Build an [`SupabaseError::Api`] from an error status and body.
fn api_error(status: StatusCode, body: &str) -> SupabaseError {
    if status.is_server_error() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Supabase returned server error"
        );
    } else {
        tracing::debug!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Supabase returned client error"
        );
    }

    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    SupabaseError::Api {
        status: status.as_u16(),
        code: parsed.code(),
        message: parsed
            .message()
            .unwrap_or_else(|| format!("HTTP {status}: {}", body.chars().take(200).collect::<String>())),
    }
}
