//! Listing detail route handler.
//!
//! Listings the device has seen are served from its discovery session;
//! anything else (e.g. a shared link) is fetched from Supabase.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use rentswipe_core::{Listing, ListingId, Owner, ShareData};

use crate::error::Result;
use crate::filters;
use crate::middleware::Device;
use crate::state::AppState;

/// Owner card display data.
#[derive(Clone)]
pub struct OwnerView {
    pub name: String,
    pub avatar: Option<String>,
    pub verified: bool,
}

impl From<&Owner> for OwnerView {
    fn from(owner: &Owner) -> Self {
        Self {
            name: owner.name.clone(),
            avatar: (!owner.avatar.is_empty()).then(|| owner.avatar.clone()),
            verified: owner.verified,
        }
    }
}

/// Listing detail display data.
#[derive(Clone)]
pub struct RentalView {
    pub id: String,
    pub images: Vec<String>,
    pub price: String,
    pub address: String,
    pub city: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: bool,
    pub sqft: String,
    pub description: String,
    pub highlights: Vec<String>,
    /// Amenities beyond the highlights, shown as "+N more".
    pub more_amenities: usize,
    pub owner: OwnerView,
    pub share: ShareData,
}

impl RentalView {
    fn new(listing: &Listing, share_base_url: &str) -> Self {
        let owner = listing.owner.clone().unwrap_or_else(Owner::host);
        Self {
            id: listing.id.to_string(),
            images: listing.images.clone(),
            price: listing.price_label(),
            address: listing.address.clone(),
            city: listing.city.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            parking: listing.parking,
            sqft: listing.sqft_label(),
            description: listing.description.clone(),
            highlights: listing.highlights().to_vec(),
            more_amenities: listing.hidden_amenities(),
            owner: OwnerView::from(&owner),
            share: ShareData::for_listing(listing, share_base_url),
        }
    }
}

/// Listing detail template.
#[derive(Template, WebTemplate)]
#[template(path = "rental.html")]
pub struct RentalTemplate {
    pub rental: RentalView,
}

/// Display a listing's detail sheet.
#[instrument(skip(state, device), fields(device = %device.id))]
pub async fn show(
    State(state): State<AppState>,
    device: Device,
    Path(id): Path<String>,
) -> Result<RentalTemplate> {
    let id = ListingId::new(id);

    let listing = match state.discovery().find(&device.id, &id).await {
        Some(listing) => listing,
        None => state.supabase().fetch_listing(&id).await?,
    };

    Ok(RentalTemplate {
        rental: RentalView::new(&listing, &state.config().share_base_url),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_rental_view_collapses_amenities() {
        let listing = Listing {
            id: ListingId::new("r-9"),
            images: vec!["https://img/1.jpg".to_string()],
            price: Decimal::from(2450),
            currency: "$".to_string(),
            address: "12 Oak Ave".to_string(),
            city: "Austin".to_string(),
            bedrooms: 2,
            bathrooms: 1,
            parking: true,
            sqft: Decimal::from(900),
            description: "Sunny".to_string(),
            amenities: ["Gym", "Pool", "Laundry", "Balcony", "Doorman", "Storage"]
                .map(String::from)
                .to_vec(),
            owner: None,
        };

        let view = RentalView::new(&listing, "https://rentswipe.app");

        assert_eq!(view.highlights.len(), 4);
        assert_eq!(view.more_amenities, 2);
        assert_eq!(view.price, "$2,450");
        assert_eq!(view.owner.name, "Host");
        assert!(view.owner.avatar.is_none());
        assert_eq!(view.share.url, "https://rentswipe.app/rentals/r-9");
    }
}
