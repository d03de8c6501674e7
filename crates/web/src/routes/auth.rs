//! Authentication route handlers.
//!
//! Sign-in, sign-up and sign-out against Supabase Auth. Every action
//! redirects back to the profile page with a one-shot message.

use axum::{Form, extract::State, response::Redirect};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::{Flash, session_keys};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;
use crate::supabase::{AuthSession, SignUpOutcome};

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Handle sign-in form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let service = AuthService::new(state.supabase());

    let flash = match service
        .sign_in(&form.email, SecretString::from(form.password))
        .await
    {
        Ok(auth) => {
            start_session(&session, &auth).await?;
            Flash::info(format!("Welcome back, {}!", auth.user.name))
        }
        Err(e) => {
            log_failure("Sign-in", &e);
            Flash::error(e.user_message())
        }
    };

    session.insert(session_keys::FLASH, &flash).await?;
    Ok(Redirect::to("/profile"))
}

/// Handle sign-up form submission.
///
/// Projects that require email confirmation return no session; the user is
/// asked to confirm and then sign in.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let service = AuthService::new(state.supabase());

    let flash = match service
        .sign_up(&form.email, SecretString::from(form.password), &form.full_name)
        .await
    {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            start_session(&session, &auth).await?;
            Flash::info(format!("Welcome to RentSwipe, {}!", auth.user.name))
        }
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            tracing::info!(user_id = %user.id, "Sign-up awaiting email confirmation");
            Flash::info(format!(
                "Check {} to confirm your account, then sign in.",
                user.email
            ))
        }
        Err(e) => {
            log_failure("Sign-up", &e);
            Flash::error(e.user_message())
        }
    };

    session.insert(session_keys::FLASH, &flash).await?;
    Ok(Redirect::to("/profile"))
}

/// Handle sign-out.
///
/// The local session is cleared even if Supabase cannot be reached. Device
/// state and favorites stay.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(auth): OptionalUser,
) -> Result<Redirect> {
    if let Some(auth) = auth {
        if let Err(e) = AuthService::new(state.supabase()).sign_out(&auth).await {
            tracing::warn!(user_id = %auth.user.id, error = %e, "Remote sign-out failed");
        }
        add_breadcrumb("auth", "Signed out", Some(&[("user_id", auth.user.id.as_str())]));
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    session
        .insert(session_keys::FLASH, Flash::info("You have been signed out."))
        .await?;
    Ok(Redirect::to("/profile"))
}

async fn start_session(
    session: &Session,
    auth: &AuthSession,
) -> std::result::Result<(), tower_sessions::session::Error> {
    set_current_user(session, auth).await?;
    set_sentry_user(&auth.user.id, Some(&auth.user.email));
    add_breadcrumb("auth", "Signed in", Some(&[("user_id", auth.user.id.as_str())]));
    tracing::info!(user_id = %auth.user.id, "User signed in");
    Ok(())
}

/// Service failures are errors; refused input is expected.
fn log_failure(action: &str, err: &AuthError) {
    match err {
        AuthError::Service(_) => tracing::error!(error = %err, "{action} failed"),
        _ => tracing::info!(error = %err, "{action} refused"),
    }
}
