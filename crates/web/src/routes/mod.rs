//! HTTP route handlers for RentSwipe.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /onboarding or /discover
//! GET  /health                 - Health check
//!
//! # Discovery
//! GET  /discover               - Card stack (first visit waits for page 0)
//! POST /discover/swipe         - Swipe by displacement (dx) or direction
//! POST /discover/review-again  - Clear decided cards, refetch page 0
//!
//! # Filters & Onboarding
//! GET  /filters                - Filter editor
//! POST /filters                - Apply filters
//! GET  /onboarding             - Current wizard step
//! POST /onboarding             - Submit wizard step
//!
//! # Favorites & Listings
//! GET  /favorites              - Favorites with share buttons
//! GET  /rentals/{id}           - Listing detail sheet
//!
//! # Profile & Auth
//! GET  /profile                - Profile, or sign-in/sign-up forms
//! POST /auth/login             - Sign in
//! POST /auth/signup            - Sign up
//! POST /auth/logout            - Sign out
//!
//! # Assets
//! GET  /static/*               - CSS, JS, images
//! ```
//!
//! Swipe and review-again answer `HX-Request` posts with the deck fragment
//! and plain form posts with a 303 to `/discover`.

pub mod auth;
pub mod discover;
pub mod favorites;
pub mod filter_editor;
pub mod onboarding;
pub mod profile;
pub mod rentals;

use axum::{
    Router,
    extract::Request,
    response::Redirect,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{Device, create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the discovery routes router.
pub fn discover_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(discover::show))
        .route("/swipe", post(discover::swipe))
        .route("/review-again", post(discover::review_again))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .nest("/discover", discover_routes())
        .route(
            "/filters",
            get(filter_editor::show).post(filter_editor::apply),
        )
        .route(
            "/onboarding",
            get(onboarding::show).post(onboarding::submit_step),
        )
        .route("/favorites", get(favorites::index))
        .route("/rentals/{id}", get(rentals::show))
        .route("/profile", get(profile::show))
        .nest("/auth", auth_routes())
}

/// Build the full application: routes, static assets and the middleware
/// stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let static_dir = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", static_dir)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Send new devices through onboarding.
async fn home(device: Device) -> Redirect {
    if device.state.onboarded {
        Redirect::to("/discover")
    } else {
        Redirect::to("/onboarding")
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Supabase.
async fn health() -> &'static str {
    "ok"
}
