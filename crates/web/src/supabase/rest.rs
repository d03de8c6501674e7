//! PostgREST calls: listing pages, single listings, favorites.

use reqwest::StatusCode;
use tracing::{debug, instrument};
use url::Url;

use rentswipe_core::{Listing, ListingId, ListingQuery};

use super::conversions::{decode_rental, decode_rentals};
use super::types::{FavoriteInsert, FavoriteRequest, FavoriteRow};
use super::{SupabaseClient, SupabaseError, UNIQUE_VIOLATION, api_error, decode, read_body};

const RENTALS_PATH: &str = "rest/v1/rentals";
const FAVORITES_PATH: &str = "rest/v1/favorites";

impl SupabaseClient {
    /// Fetch one page of listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Supabase rejects the query.
    #[instrument(skip(self, query), fields(page = query.page, predicates = query.predicates.len()))]
    pub async fn fetch_rentals(&self, query: &ListingQuery) -> Result<Vec<Listing>, SupabaseError> {
        let url = rentals_url(&self.endpoint(RENTALS_PATH)?, query);

        let response = self
            .http()
            .get(url)
            .bearer_auth(self.anon_bearer())
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = decode(response).await?;
        let fetched = rows.len();
        let listings = decode_rentals(rows);
        debug!(count = fetched, skipped = fetched - listings.len(), "Fetched rentals page");

        Ok(listings)
    }

    /// Fetch a single listing by id, e.g. for a shared link.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if no listing has this id, or an
    /// error if the request fails.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn fetch_listing(&self, id: &ListingId) -> Result<Listing, SupabaseError> {
        if let Some(listing) = self.listing_cache().get(id).await {
            debug!("Cache hit for listing");
            return Ok(listing);
        }

        let url = listing_url(&self.endpoint(RENTALS_PATH)?, id);
        let response = self
            .http()
            .get(url)
            .bearer_auth(self.anon_bearer())
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = decode(response).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("Listing not found: {id}")))?;
        let listing = decode_rental(row)?;

        self.listing_cache()
            .insert(id.clone(), listing.clone())
            .await;

        Ok(listing)
    }

    /// Record a favorite for the signed-in user.
    ///
    /// An existing `(user_id, rental_id)` pair is reported as
    /// [`FavoriteInsert::AlreadyFavorited`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the insert is rejected for
    /// any other reason.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, listing_id = %request.listing_id))]
    pub async fn add_favorite(
        &self,
        request: &FavoriteRequest,
    ) -> Result<FavoriteInsert, SupabaseError> {
        let url = self.endpoint(FAVORITES_PATH)?;
        let body = FavoriteRow {
            user_id: request.user_id.as_str(),
            rental_id: request.listing_id.as_str(),
        };

        let response = self
            .http()
            .post(url)
            .bearer_auth(&request.access_token)
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        let (status, text) = read_body(response).await?;
        classify_favorite(status, &text)
    }
}

/// Encode a listing page request as PostgREST query parameters.
pub(super) fn rentals_url(endpoint: &Url, query: &ListingQuery) -> Url {
    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("select", "*")
            .append_pair("offset", &query.range.from.to_string())
            .append_pair("limit", &query.range.len().to_string());

        for predicate in &query.predicates {
            pairs.append_pair(
                predicate.column(),
                &format!("{}.{}", predicate.operator().as_str(), predicate.operand()),
            );
        }
    }
    url
}

fn listing_url(endpoint: &Url, id: &ListingId) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("id", &format!("eq.{id}"))
        .append_pair("limit", "1");
    url
}

fn classify_favorite(status: StatusCode, body: &str) -> Result<FavoriteInsert, SupabaseError> {
    if status.is_success() {
        return Ok(FavoriteInsert::Inserted);
    }

    let err = api_error(status, body);
    if err.code() == Some(UNIQUE_VIOLATION) {
        return Ok(FavoriteInsert::AlreadyFavorited);
    }
    Err(err)
}
