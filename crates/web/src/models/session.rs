//! Session-related types.
//!
//! Types stored in the session for device, authentication and wizard state.

use serde::{Deserialize, Serialize};

/// Severity of a one-shot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

impl FlashLevel {
    /// CSS modifier for the message banner.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// Message shown once on the next page render, e.g. after a failed sign-in
/// redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Session keys.
pub mod keys {
    pub use rentswipe_core::device::{FILTERS_KEY as FILTERS, ONBOARDED_KEY as ONBOARDED};

    /// Key for the device identifier that owns the discovery session.
    pub const DEVICE_ID: &str = "device_id";

    /// Key for the signed-in user's Supabase session.
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the onboarding wizard in progress.
    pub const ONBOARDING_WIZARD: &str = "onboarding_wizard";

    /// Key for the one-shot message.
    pub const FLASH: &str = "flash";
}
