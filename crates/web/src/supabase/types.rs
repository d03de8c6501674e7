//! Supabase wire types and the signed-in session.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentswipe_core::{ListingId, User, UserId, UserMetadata};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error body from either PostgREST (`code`, `message`, `details`, `hint`)
/// or `GoTrue` (`code` as a number, `error_code`, `msg`).
#[derive(Debug, Default, Deserialize)]
pub(super) struct ApiErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ApiErrorBody {
    pub(super) fn code(&self) -> Option<String> {
        self.error_code
            .clone()
            .or_else(|| match &self.code {
                Some(serde_json::Value::String(code)) => Some(code.clone()),
                _ => None,
            })
            .or_else(|| self.error.clone())
    }

    pub(super) fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rentals
// ─────────────────────────────────────────────────────────────────────────────

/// A row of the `rentals` relation as PostgREST returns it.
///
/// Everything but `id` may be null or absent.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RentalRow {
    /// UUID or integer primary key.
    pub id: serde_json::Value,
    pub images: Option<Vec<String>>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Counts and area are numeric columns; PostgREST may send them as
    /// fractional numbers or strings.
    pub bedrooms: Option<Decimal>,
    pub bathrooms: Option<Decimal>,
    pub parking: Option<bool>,
    pub sqft: Option<Decimal>,
    pub description: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub owner: Option<OwnerRow>,
}

/// The `owner` JSON column.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct OwnerRow {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub verified: Option<bool>,
}

/// Body of a `favorites` insert.
#[derive(Debug, Serialize)]
pub(super) struct FavoriteRow<'a> {
    pub user_id: &'a str,
    pub rental_id: &'a str,
}

/// A favorite to record for a signed-in user.
#[derive(Debug, Clone)]
pub struct FavoriteRequest {
    pub access_token: String,
    pub user_id: UserId,
    pub listing_id: ListingId,
}

/// Outcome of a favorite insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteInsert {
    Inserted,
    /// The pair already existed; treated as success.
    AlreadyFavorited,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// A `GoTrue` user record.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct AuthUserRow {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Token grant returned by sign-in and by sign-up when no confirmation is
/// required.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUserRow,
}

/// Sign-up answers with a token grant, or with the bare user when the
/// project requires email confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(AuthUserRow),
}

/// Metadata update body for `PUT /auth/v1/user`.
#[derive(Debug, Serialize)]
pub(super) struct UpdateUserBody<'a> {
    pub data: &'a UserMetadata,
}

/// A signed-in user's tokens plus their mapped profile.
///
/// Stored in the cookie session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
    pub user: User,
}

impl AuthSession {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at - 60
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    SignedIn(AuthSession),
    /// The account exists but must be confirmed by email first.
    ConfirmationRequired(User),
}
