//! Session-scoped models for the web app.

pub mod session;

pub use session::{Flash, FlashLevel, keys as session_keys};
