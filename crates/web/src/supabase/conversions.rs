//! Conversions from Supabase rows to domain types.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use tracing::warn;

use rentswipe_core::{Listing, ListingId, Owner, User, UserId, UserMetadata};

use super::types::{AuthSession, AuthUserRow, OwnerRow, RentalRow, TokenResponse};

const DEFAULT_CURRENCY: &str = "$";

/// Decode a page of raw `rentals` rows.
///
/// Rows that don't fit [`RentalRow`] are logged and skipped so one bad row
/// doesn't cost the whole page.
pub(super) fn decode_rentals(rows: Vec<serde_json::Value>) -> Vec<Listing> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().map(row_id).unwrap_or_default();
            decode_rental(row)
                .map_err(|e| warn!(rental_id = %id, error = %e, "Skipping malformed rental row"))
                .ok()
        })
        .collect()
}

/// Decode a single raw `rentals` row.
pub(super) fn decode_rental(row: serde_json::Value) -> Result<Listing, serde_json::Error> {
    serde_json::from_value(row).map(convert_rental)
}

/// Normalise a `rentals` row, filling the fields the UI relies on.
pub(super) fn convert_rental(row: RentalRow) -> Listing {
    Listing {
        id: ListingId::new(row_id(row.id)),
        images: row.images.unwrap_or_default(),
        price: row.price.unwrap_or(Decimal::ZERO),
        currency: row
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        address: row.address.unwrap_or_default(),
        city: row.city.unwrap_or_default(),
        bedrooms: whole_count(row.bedrooms),
        bathrooms: whole_count(row.bathrooms),
        parking: row.parking.unwrap_or_default(),
        sqft: row.sqft.unwrap_or_default().max(Decimal::ZERO),
        description: row.description.unwrap_or_default(),
        amenities: row.amenities.unwrap_or_default(),
        owner: Some(row.owner.map_or_else(Owner::host, convert_owner)),
    }
}

fn convert_owner(row: OwnerRow) -> Owner {
    let host = Owner::host();
    Owner {
        name: row.name.filter(|n| !n.is_empty()).unwrap_or(host.name),
        avatar: row.avatar.unwrap_or(host.avatar),
        verified: row.verified.unwrap_or(host.verified),
    }
}

/// Room counts round down; negative or oversized values read as zero.
fn whole_count(value: Option<Decimal>) -> u32 {
    value
        .and_then(|count| count.trunc().to_u32())
        .unwrap_or_default()
}

/// Primary keys arrive as strings (UUIDs) or numbers.
fn row_id(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Map a `GoTrue` user to the app's [`User`].
///
/// Metadata keys are read one at a time; a key holding the wrong type is
/// logged and treated as absent without discarding the others.
pub(super) fn convert_user(row: AuthUserRow) -> User {
    let bag = &row.user_metadata;
    let metadata = UserMetadata {
        full_name: metadata_key(&row.id, bag, "full_name"),
        avatar_url: metadata_key(&row.id, bag, "avatar_url"),
        bio: metadata_key(&row.id, bag, "bio"),
        onboarding_completed: metadata_key(&row.id, bag, "onboarding_completed"),
        preferences: metadata_key(&row.id, bag, "preferences"),
    };

    User::from_parts(UserId::new(row.id), row.email.as_deref(), metadata)
}

fn metadata_key<T: DeserializeOwned>(user_id: &str, bag: &serde_json::Value, key: &str) -> Option<T> {
    let value = bag.get(key).filter(|v| !v.is_null())?;
    serde_json::from_value(value.clone())
        .map_err(|e| warn!(user_id, key, error = %e, "Ignoring malformed user metadata"))
        .ok()
}

/// Build the stored session from a token grant.
pub(super) fn convert_token(token: TokenResponse, now: i64) -> AuthSession {
    AuthSession {
        expires_at: token.expires_at.unwrap_or(now + token.expires_in),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        user: convert_user(token.user),
    }
}
