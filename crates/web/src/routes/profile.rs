//! Profile route handler.
//!
//! Shows the signed-in user with their saved search preferences, or the
//! sign-in and sign-up forms.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use rentswipe_core::{FilterState, User};

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, update_current_user};
use crate::models::{Flash, session_keys};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;
use crate::supabase::AuthSession;

// =============================================================================
// View Types
// =============================================================================

/// Profile display data for templates.
#[derive(Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    /// e.g. `$0 - $3000`.
    pub budget: String,
    pub location: String,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        let prefs = &user.preferences;
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
            budget: format!(
                "${} - ${}",
                prefs.min_price.normalize(),
                prefs.max_price.normalize()
            ),
            location: prefs.location_query().unwrap_or("Anywhere").to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user: Option<ProfileView>,
    pub flash: Option<Flash>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the profile, or the sign-in forms when nobody is signed in.
///
/// The stored user is re-read from Supabase so metadata edits made elsewhere
/// show up.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(auth): OptionalUser,
) -> Result<impl IntoResponse> {
    let mut flash = session.remove::<Flash>(session_keys::FLASH).await?;

    let user = match auth {
        Some(auth) => match AuthService::new(state.supabase()).refresh_user(&auth).await {
            Ok(fresh) => {
                update_current_user(&session, &fresh).await?;
                Some(fresh.user)
            }
            Err(AuthError::NotSignedIn) => {
                tracing::info!(user_id = %auth.user.id, "Stored session no longer valid");
                clear_current_user(&session).await?;
                flash = Some(Flash::error(AuthError::NotSignedIn.user_message()));
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh user, showing stored profile");
                Some(auth.user)
            }
        },
        None => None,
    };

    Ok(ProfileTemplate {
        user: user.as_ref().map(ProfileView::from),
        flash,
    })
}

/// Save `filters` as the user's preferences.
///
/// Failures are logged and otherwise ignored; the device keeps its filters
/// either way.
pub(super) async fn save_preferences_best_effort(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
    filters: &FilterState,
) {
    match AuthService::new(state.supabase())
        .save_preferences(auth, filters)
        .await
    {
        Ok(updated) => {
            if let Err(e) = update_current_user(session, &updated).await {
                tracing::warn!(error = %e, "Failed to store updated user");
            }
        }
        Err(e) => {
            tracing::warn!(user_id = %auth.user.id, error = %e, "Failed to save preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use rentswipe_core::{UserId, UserMetadata};

    use super::*;

    #[test]
    fn test_profile_view_preferences() {
        let user = User::from_parts(
            UserId::new("u-1"),
            Some("sam@example.com"),
            UserMetadata {
                preferences: Some(FilterState {
                    max_price: Decimal::from(3000),
                    location: "Austin".to_string(),
                    ..FilterState::initial()
                }),
                ..UserMetadata::default()
            },
        );

        let view = ProfileView::from(&user);

        assert_eq!(view.name, "sam");
        assert_eq!(view.budget, "$0 - $3000");
        assert_eq!(view.location, "Austin");
    }

    #[test]
    fn test_profile_view_fallback_preferences() {
        let user = User::from_parts(UserId::new("u-1"), None, UserMetadata::default());

        let view = ProfileView::from(&user);

        assert_eq!(view.budget, "$0 - $10000");
        assert_eq!(view.location, "Anywhere");
    }
}
