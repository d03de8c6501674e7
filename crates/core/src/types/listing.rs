//! Rental listing types.
//!
//! Listings are created by the remote data service and are read-only here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ListingId;

/// Number of amenity labels shown before collapsing into a "+N more" badge.
pub const HIGHLIGHT_COUNT: usize = 4;

/// A rental property shown as a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Image URLs in display order. May be empty.
    pub images: Vec<String>,
    /// Monthly rent.
    pub price: Decimal,
    /// Currency symbol, e.g. `$`.
    pub currency: String,
    pub address: String,
    pub city: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: bool,
    /// Floor area in square feet. Some rows carry fractional areas.
    pub sqft: Decimal,
    pub description: String,
    pub amenities: Vec<String>,
    pub owner: Option<Owner>,
}

/// Owner or listing agent attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    /// Avatar URL, empty when the backend has none.
    pub avatar: String,
    pub verified: bool,
}

impl Owner {
    /// Owner record used when a row carries none.
    #[must_use]
    pub fn host() -> Self {
        Self {
            name: "Host".to_string(),
            avatar: String::new(),
            verified: false,
        }
    }
}

impl Listing {
    /// First image, used as the favorites thumbnail.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Price with currency symbol and thousands separators, e.g. `$2,450`.
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("{}{}", self.currency, group_thousands(self.price))
    }

    /// Floor area with thousands separators, e.g. `1,200` or `812.50`.
    #[must_use]
    pub fn sqft_label(&self) -> String {
        group_thousands(self.sqft)
    }

    /// Amenities shown in the detail sheet's highlight row.
    #[must_use]
    pub fn highlights(&self) -> &[String] {
        let end = self.amenities.len().min(HIGHLIGHT_COUNT);
        self.amenities.get(..end).unwrap_or_default()
    }

    /// Count of amenities hidden behind the "+N more" badge.
    #[must_use]
    pub fn hidden_amenities(&self) -> usize {
        self.amenities.len().saturating_sub(HIGHLIGHT_COUNT)
    }
}

/// Format a decimal with `,` thousands separators. Whole amounts drop the
/// fractional part; others keep two places.
fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = if rounded.fract().is_zero() {
        rounded.trunc().to_string()
    } else {
        format!("{rounded:.2}")
    };

    let (sign, digits) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    let (whole, fraction) = digits
        .split_once('.')
        .map_or((digits, None), |(w, f)| (w, Some(f)));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use super::{Listing, Owner};
    use crate::types::ListingId;

    /// A plain listing for tests; vary fields with struct update syntax.
    pub fn listing(id: &str) -> Listing {
        Listing {
            id: ListingId::new(id),
            images: vec![format!("https://img.example.com/{id}.jpg")],
            price: Decimal::from(1800),
            currency: "$".to_string(),
            address: format!("{id} Congress Ave"),
            city: "Austin".to_string(),
            bedrooms: 1,
            bathrooms: 1,
            parking: false,
            sqft: Decimal::from(650),
            description: String::new(),
            amenities: Vec::new(),
            owner: Some(Owner::host()),
        }
    }
}
