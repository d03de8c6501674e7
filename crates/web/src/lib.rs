//! RentSwipe web library.
//!
//! Server-rendered swipe-to-browse rentals app backed by Supabase. Exposed as
//! a library so the router can be tested without binding a port.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
