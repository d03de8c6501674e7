//! Share payload for a favorited listing.

use serde::Serialize;

use crate::types::Listing;

/// Title, text and link handed to the browser's share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareData {
    /// Build the payload for `listing`, linking under `base_url`.
    ///
    /// ```
    /// # use rentswipe_core::{Listing, ListingId, ShareData};
    /// # use rust_decimal::Decimal;
    /// let listing = Listing {
    ///     id: ListingId::new("42"),
    ///     images: vec![],
    ///     price: Decimal::from(2450),
    ///     currency: "$".into(),
    ///     address: "1 Main St".into(),
    ///     city: "Austin".into(),
    ///     bedrooms: 2,
    ///     bathrooms: 1,
    ///     parking: false,
    ///     sqft: Decimal::from(900),
    ///     description: String::new(),
    ///     amenities: vec![],
    ///     owner: None,
    /// };
    /// let share = ShareData::for_listing(&listing, "https://rentswipe.app/");
    /// assert_eq!(share.url, "https://rentswipe.app/rentals/42");
    /// ```
    #[must_use]
    pub fn for_listing(listing: &Listing, base_url: &str) -> Self {
        Self {
            title: format!("Apartment for rent in {}", listing.city),
            text: format!(
                "Check out this {} bed, {} bath rental for {}{} on RentSwipe!",
                listing.bedrooms,
                listing.bathrooms,
                listing.currency,
                listing.price.normalize(),
            ),
            url: format!("{}/rentals/{}", base_url.trim_end_matches('/'), listing.id),
        }
    }
}
