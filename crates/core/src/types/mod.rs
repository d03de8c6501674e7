//! Core types for RentSwipe.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the discovery, favorites, and profile components.

pub mod email;
pub mod filter;
pub mod id;
pub mod listing;
pub mod user;

pub use email::{Email, EmailError};
pub use filter::{FilterError, FilterState, MAX_RADIUS_KM, MIN_RADIUS_KM};
pub use id::*;
pub use listing::{Listing, Owner};
pub use user::{User, UserMetadata, placeholder_avatar};
