//! HTTP middleware stack for RentSwipe.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//!
//! Extractors read the session per request: [`Device`] for device state,
//! [`OptionalUser`] for the signed-in user.

pub mod auth;
pub mod device;
pub mod request_id;
pub mod session;

pub use auth::{OptionalUser, clear_current_user, set_current_user, update_current_user};
pub use device::Device;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
