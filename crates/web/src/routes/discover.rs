//! Discovery route handlers.
//!
//! The card stack is rendered server-side. `swipe.js` posts drags and button
//! presses with an `HX-Request` header and swaps in the returned deck
//! fragment; without script the forms post normally and are redirected back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use rentswipe_core::{DiscoveryError, Listing, ListingId, SwipeDirection, resolve_drag};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Device, OptionalUser};
use crate::services::Deck;
use crate::state::AppState;

/// Header set by `swipe.js` on fragment requests.
const HX_REQUEST: &str = "hx-request";

// =============================================================================
// View Types
// =============================================================================

/// One card in the stack.
#[derive(Clone)]
pub struct CardView {
    pub id: String,
    /// All photos; the front card steps through them, the others show the
    /// first.
    pub images: Vec<String>,
    pub price: String,
    pub address: String,
    pub city: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: String,
    pub parking: bool,
}

impl From<&Listing> for CardView {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.to_string(),
            images: listing.images.clone(),
            price: listing.price_label(),
            address: listing.address.clone(),
            city: listing.city.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            sqft: listing.sqft_label(),
            parking: listing.parking,
        }
    }
}

/// The card stack and its status.
#[derive(Clone)]
pub struct DeckView {
    /// Front card first.
    pub cards: Vec<CardView>,
    /// A page is still being fetched.
    pub loading: bool,
    pub favorite_count: usize,
}

impl From<&Deck> for DeckView {
    fn from(deck: &Deck) -> Self {
        Self {
            cards: deck.cards.iter().map(CardView::from).collect(),
            loading: deck.loading,
            favorite_count: deck.favorite_count,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Discovery page template.
#[derive(Template, WebTemplate)]
#[template(path = "discover.html")]
pub struct DiscoverTemplate {
    pub deck: DeckView,
    pub location: String,
}

/// Card stack fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/deck.html")]
pub struct DeckTemplate {
    pub deck: DeckView,
}

// =============================================================================
// Form Types
// =============================================================================

/// Swipe form data.
///
/// The script sends the drag displacement `dx`; the buttons send an explicit
/// `direction`.
#[derive(Debug, Deserialize)]
pub struct SwipeForm {
    pub listing_id: String,
    pub dx: Option<f64>,
    pub direction: Option<String>,
}

impl SwipeForm {
    /// The decision this form expresses, or `None` for a drag that did not
    /// cross the threshold.
    fn decision(&self) -> Result<Option<SwipeDirection>> {
        if let Some(direction) = &self.direction {
            return direction
                .parse()
                .map(Some)
                .map_err(|e| AppError::BadRequest(format!("{e}")));
        }
        match self.dx {
            Some(dx) if dx.is_finite() => Ok(resolve_drag(dx)),
            _ => Err(AppError::BadRequest(
                "swipe needs a direction or a displacement".to_string(),
            )),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the card stack.
///
/// Devices that have not finished onboarding are sent to the wizard. The
/// first visit waits for page 0. Script requests get just the deck
/// fragment, which is how a loading deck refreshes itself.
#[instrument(skip(state, device, headers), fields(device = %device.id))]
pub async fn show(State(state): State<AppState>, device: Device, headers: HeaderMap) -> Response {
    if !device.state.onboarded {
        return Redirect::to("/onboarding").into_response();
    }

    let deck = state
        .discovery()
        .deck(&device.id, &device.state.filters)
        .await;

    if headers.contains_key(HX_REQUEST) {
        return DeckTemplate {
            deck: DeckView::from(&deck),
        }
        .into_response();
    }

    DiscoverTemplate {
        deck: DeckView::from(&deck),
        location: device
            .state
            .filters
            .location_query()
            .unwrap_or("Anywhere")
            .to_string(),
    }
    .into_response()
}

/// Handle a swipe.
///
/// A right swipe is saved remotely when a user is signed in; the refill and
/// the favorite insert run after the response. When the swipe emptied the
/// stack they run first, so the response has cards to show.
#[instrument(skip(state, device, user, headers, form), fields(device = %device.id, listing_id = %form.listing_id))]
pub async fn swipe(
    State(state): State<AppState>,
    device: Device,
    OptionalUser(user): OptionalUser,
    headers: HeaderMap,
    Form(form): Form<SwipeForm>,
) -> Result<Response> {
    let discovery = state.discovery();
    let filters = &device.state.filters;

    let Some(direction) = form.decision()? else {
        // Below the threshold: the card snaps back.
        let deck = discovery.deck(&device.id, filters).await;
        return Ok(deck_response(&headers, &deck));
    };

    let id = ListingId::new(form.listing_id);
    match discovery
        .swipe(&device.id, filters, &id, direction, user.as_ref())
        .await
    {
        Ok((deck, follow_up)) => {
            add_breadcrumb(
                "discover",
                "Swiped",
                Some(&[("listing_id", id.as_str()), ("direction", direction.as_str())]),
            );
            let deck = if deck.is_empty() && follow_up.refills() {
                discovery.settle_follow_up(follow_up).await
            } else {
                discovery.spawn_follow_up(follow_up);
                deck
            };
            Ok(deck_response(&headers, &deck))
        }
        Err(DiscoveryError::NotInQueue(id)) => {
            tracing::debug!(listing_id = %id, "Swipe on a card no longer in the queue");
            let deck = discovery.deck(&device.id, filters).await;
            Ok(deck_response(&headers, &deck))
        }
    }
}

/// Clear the decided set and start again from page 0.
#[instrument(skip(state, device, headers), fields(device = %device.id))]
pub async fn review_again(
    State(state): State<AppState>,
    device: Device,
    headers: HeaderMap,
) -> Response {
    let deck = state
        .discovery()
        .review_again(&device.id, &device.state.filters)
        .await;

    deck_response(&headers, &deck)
}

/// Fragment for script requests, redirect for plain form posts.
fn deck_response(headers: &HeaderMap, deck: &Deck) -> Response {
    if headers.contains_key(HX_REQUEST) {
        DeckTemplate {
            deck: DeckView::from(deck),
        }
        .into_response()
    } else {
        Redirect::to("/discover").into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(dx: Option<f64>, direction: Option<&str>) -> SwipeForm {
        SwipeForm {
            listing_id: "r-1".to_string(),
            dx,
            direction: direction.map(String::from),
        }
    }

    #[test]
    fn test_decision_from_displacement() {
        assert_eq!(
            form(Some(120.0), None).decision().unwrap(),
            Some(SwipeDirection::Right)
        );
        assert_eq!(form(Some(-80.0), None).decision().unwrap(), None);
        assert_eq!(
            form(Some(-150.0), None).decision().unwrap(),
            Some(SwipeDirection::Left)
        );
    }

    #[test]
    fn test_explicit_direction_wins() {
        assert_eq!(
            form(Some(10.0), Some("right")).decision().unwrap(),
            Some(SwipeDirection::Right)
        );
    }

    #[test]
    fn test_missing_or_bad_decision() {
        assert!(matches!(
            form(None, None).decision(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            form(Some(f64::NAN), None).decision(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            form(None, Some("up")).decision(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_deck_response_redirects_plain_posts() {
        let deck = Deck {
            cards: vec![],
            loading: false,
            has_more: true,
            favorite_count: 0,
        };

        let response = deck_response(&HeaderMap::new(), &deck);
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/discover");

        let mut headers = HeaderMap::new();
        headers.insert(HX_REQUEST, "true".parse().unwrap());
        let response = deck_response(&headers, &deck);
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    fn card(id: &str, images: &[&str]) -> CardView {
        CardView {
            id: id.to_string(),
            images: images.iter().map(ToString::to_string).collect(),
            price: "$1,800".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            bedrooms: 1,
            bathrooms: 1,
            sqft: "650".to_string(),
            parking: false,
        }
    }

    #[test]
    fn test_front_card_renders_every_photo() {
        let deck = DeckView {
            cards: vec![
                card("front", &["https://img/f1.jpg", "https://img/f2.jpg", "https://img/f3.jpg"]),
                card("next", &["https://img/n1.jpg", "https://img/n2.jpg"]),
            ],
            loading: false,
            favorite_count: 0,
        };

        let html = DeckTemplate { deck }.render().unwrap();
        assert_eq!(html.matches("data-card-image").count(), 3);
        assert_eq!(html.matches("data-card-dot").count(), 3);
        assert_eq!(html.matches("card__dot--active").count(), 1);
        assert!(html.contains("https://img/f3.jpg"));
        assert!(html.contains("https://img/n1.jpg"));
        assert!(!html.contains("https://img/n2.jpg"));
    }

    #[test]
    fn test_loading_deck_refreshes_itself() {
        let deck = DeckView {
            cards: vec![],
            loading: true,
            favorite_count: 0,
        };

        let html = DeckTemplate { deck }.render().unwrap();
        assert!(html.contains("data-deck-refresh"));
    }
}
