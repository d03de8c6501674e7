//! Signed-in user profile.
//!
//! The auth service owns users; this is the local shape the profile view and
//! discovery service read, rebuilt from the service's user record on every
//! sign-in.

use serde::{Deserialize, Serialize};

use super::{Email, FilterState, UserId};

/// Name shown when neither metadata nor email provide one.
const ANONYMOUS_NAME: &str = "User";

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Empty when the account has no email (e.g. phone sign-in).
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub onboarding_completed: bool,
    /// Saved search preferences; [`FilterState::preference_fallback`] when none are stored.
    pub preferences: FilterState,
}

/// Open metadata bag the auth service stores per user.
///
/// Every field is optional; missing ones fall back when building a [`User`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<FilterState>,
}

impl User {
    /// Build the local user from the auth service's id, email and metadata.
    #[must_use]
    pub fn from_parts(id: UserId, email: Option<&str>, metadata: UserMetadata) -> Self {
        let email = email.unwrap_or_default().to_owned();
        let name = non_empty(metadata.full_name)
            .or_else(|| {
                Email::parse(&email)
                    .ok()
                    .map(|e| e.local_part().to_owned())
            })
            .unwrap_or_else(|| ANONYMOUS_NAME.to_owned());
        let avatar = non_empty(metadata.avatar_url).unwrap_or_else(|| placeholder_avatar(&id));

        Self {
            name,
            email,
            avatar,
            bio: metadata.bio.unwrap_or_default(),
            onboarding_completed: metadata.onboarding_completed.unwrap_or(false),
            preferences: metadata
                .preferences
                .unwrap_or_else(FilterState::preference_fallback),
            id,
        }
    }
}

/// Generated avatar for users without one.
#[must_use]
pub fn placeholder_avatar(id: &UserId) -> String {
    format!("https://i.pravatar.cc/150?u={id}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
