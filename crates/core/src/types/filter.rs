//! Search constraints chosen during onboarding or in the filter editor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest radius the editors offer, in km.
pub const MIN_RADIUS_KM: u32 = 1;
/// Largest radius the editors offer, in km.
pub const MAX_RADIUS_KM: u32 = 50;

/// Reasons a submitted filter form is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("radius must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM} km")]
    RadiusOutOfRange,
}

/// The user's search constraints.
///
/// Serialized field names match the preference record kept in the auth
/// service's user metadata (`minPrice`, `parkingOnly`, ...), so the same value
/// round-trips through device storage and the user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Lower price bound; zero means unbounded.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_price: Decimal,
    /// Upper price bound; [`crate::PRICE_CEILING`] or above means unbounded.
    #[serde(with = "rust_decimal::serde::float")]
    pub max_price: Decimal,
    /// Minimum bedrooms; zero means any.
    pub beds: u32,
    /// Minimum bathrooms; zero means any.
    pub baths: u32,
    pub parking_only: bool,
    /// Free-text city match; empty means anywhere.
    pub location: String,
    /// Search radius in km. Collected and shown, never sent as a predicate.
    pub radius: u32,
}

impl FilterState {
    /// Filters used before the visitor has saved any.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            min_price: Decimal::ZERO,
            max_price: Decimal::from(5000),
            beds: 0,
            baths: 0,
            parking_only: false,
            location: String::new(),
            radius: 10,
        }
    }

    /// Starting point for the onboarding wizard.
    #[must_use]
    pub fn onboarding_draft() -> Self {
        Self {
            max_price: Decimal::from(3000),
            beds: 1,
            baths: 1,
            ..Self::initial()
        }
    }

    /// Preferences assumed for a user whose profile has none saved.
    #[must_use]
    pub fn preference_fallback() -> Self {
        Self {
            max_price: Decimal::from(10_000),
            ..Self::initial()
        }
    }

    /// The trimmed location, or `None` when it imposes no constraint.
    #[must_use]
    pub fn location_query(&self) -> Option<&str> {
        let trimmed = self.location.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Check the bounds the editors enforce.
    ///
    /// `min_price <= max_price` is deliberately not checked.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] for a negative price or a radius outside 1-50 km.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.min_price.is_sign_negative() || self.max_price.is_sign_negative() {
            return Err(FilterError::NegativePrice);
        }
        if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&self.radius) {
            return Err(FilterError::RadiusOutOfRange);
        }
        Ok(())
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::initial()
    }
}
