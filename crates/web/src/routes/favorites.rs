//! Favorites route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use rentswipe_core::{Listing, ShareData};

use crate::filters;
use crate::middleware::Device;
use crate::state::AppState;

/// A favorited listing with its share payload.
#[derive(Clone)]
pub struct FavoriteView {
    pub id: String,
    pub image: Option<String>,
    pub price: String,
    pub city: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub share: ShareData,
}

impl FavoriteView {
    fn new(listing: &Listing, share_base_url: &str) -> Self {
        Self {
            id: listing.id.to_string(),
            image: listing.cover_image().map(String::from),
            price: listing.price_label(),
            city: listing.city.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            share: ShareData::for_listing(listing, share_base_url),
        }
    }
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites.html")]
pub struct FavoritesTemplate {
    pub favorites: Vec<FavoriteView>,
}

/// Display the device's favorites, oldest first.
pub async fn index(State(state): State<AppState>, device: Device) -> impl IntoResponse {
    let share_base_url = &state.config().share_base_url;
    let favorites = state
        .discovery()
        .favorites(&device.id)
        .await
        .iter()
        .map(|listing| FavoriteView::new(listing, share_base_url))
        .collect();

    FavoritesTemplate { favorites }
}
