//! Authentication service.
//!
//! Thin layer over the Supabase auth API: validates form input, maps
//! Supabase failures to [`AuthError`], and builds the metadata writes the
//! app performs on a user's behalf.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use rentswipe_core::{Email, FilterState, UserMetadata};

use crate::supabase::{AuthSession, SignUpOutcome, SupabaseClient};

/// Minimum password length (the Supabase default).
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if Supabase rejects the pair.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.client.sign_in(&email, &password).await?)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short or
    /// Supabase refuses it.
    /// Returns `AuthError::UserAlreadyExists` if the email is registered.
    #[instrument(skip(self, password, full_name))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: SecretString,
        full_name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;

        Ok(self
            .client
            .sign_up(&email, &password, full_name.trim())
            .await?)
    }

    /// Revoke the session on Supabase.
    ///
    /// # Errors
    ///
    /// Returns an error if Supabase could not be reached or rejected the token.
    pub async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        Ok(self.client.sign_out(&session.access_token).await?)
    }

    /// Re-read the user behind a stored session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` if the session has expired or the
    /// token is no longer accepted.
    pub async fn refresh_user(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        if session.is_expired() {
            return Err(AuthError::NotSignedIn);
        }
        let user = self.client.get_user(&session.access_token).await?;
        Ok(AuthSession {
            user,
            ..session.clone()
        })
    }

    /// Save `filters` as the user's preferences and mark onboarding done.
    ///
    /// Returns the session with the updated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` if the session has expired, or an
    /// error if Supabase rejects the update.
    #[instrument(skip_all, fields(user_id = %session.user.id))]
    pub async fn save_preferences(
        &self,
        session: &AuthSession,
        filters: &FilterState,
    ) -> Result<AuthSession, AuthError> {
        if session.is_expired() {
            return Err(AuthError::NotSignedIn);
        }

        let user = self
            .client
            .update_metadata(&session.access_token, &preferences_update(filters))
            .await?;

        Ok(AuthSession {
            user,
            ..session.clone()
        })
    }
}

/// Metadata written when preferences are saved.
fn preferences_update(filters: &FilterState) -> UserMetadata {
    UserMetadata {
        preferences: Some(filters.clone()),
        onboarding_completed: Some(true),
        ..UserMetadata::default()
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(matches!(
            validate_password("abc"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("abcdef").is_ok());
    }

    #[test]
    fn test_preferences_update_only_touches_two_fields() {
        let json = serde_json::to_value(preferences_update(&FilterState::initial())).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(json["onboarding_completed"], serde_json::json!(true));
        assert_eq!(json["preferences"]["maxPrice"], serde_json::json!(5000.0));
    }
}
