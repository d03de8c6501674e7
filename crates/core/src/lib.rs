//! RentSwipe Core - Domain types and client-side state machines.
//!
//! This crate provides the pieces of RentSwipe that do not touch the network:
//! - Listing, filter, and user types shared by every component
//! - The discovery state machine (queue, decided set, favorites, refill policy)
//! - The swipe gesture rule
//! - The backend-neutral listing query built from a filter state
//! - The first-run onboarding wizard
//!
//! # Architecture
//!
//! The core crate contains only types and state transitions - no I/O, no HTTP
//! clients, no async. Callers drive fetches themselves and feed the results
//! back in, which keeps every rule here testable without a backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod device;
pub mod discovery;
pub mod onboarding;
pub mod query;
pub mod share;
pub mod swipe;
pub mod types;

pub use device::DeviceState;
pub use discovery::{ApplyOutcome, DiscoveryError, DiscoverySession, FetchTicket, SwipeOutcome};
pub use onboarding::{OnboardingStep, OnboardingWizard, StepResult};
pub use query::{ListingQuery, PAGE_SIZE, PRICE_CEILING, PageRange, Predicate};
pub use share::ShareData;
pub use swipe::{SWIPE_THRESHOLD_PX, SwipeDirection, resolve_drag};
pub use types::*;
