//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Sign-in, sign-up, sign-out and preference writes against Supabase Auth
//! - `discovery` - Per-device card queues, swipes, refills and favorites

pub mod auth;
pub mod discovery;

pub use auth::{AuthError, AuthService};
pub use discovery::{Deck, DiscoveryService, FollowUp, ListingBackend};
