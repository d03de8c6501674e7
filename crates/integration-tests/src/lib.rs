//! Integration tests for RentSwipe.
//!
//! These run against a live server and a Supabase project, so every test is
//! `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the app (needs SUPABASE_URL and SUPABASE_ANON_KEY)
//! cargo run -p rentswipe-web
//!
//! # Run integration tests
//! RENTSWIPE_TEST_URL=http://localhost:3000 cargo test -p rentswipe-integration-tests -- --ignored
//! ```

use reqwest::{Client, redirect};

/// Base URL of the running app (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("RENTSWIPE_TEST_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A client that keeps the session cookie, like a single device.
///
/// Redirects are not followed so tests can assert on them.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn device_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}
