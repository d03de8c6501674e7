//! Authentication error types.

use thiserror::Error;

use crate::supabase::SupabaseError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] rentswipe_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already uses this email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The account must be confirmed by email before signing in.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// No signed-in user, or the session expired.
    #[error("not signed in")]
    NotSignedIn,

    /// Supabase failed or answered unexpectedly.
    #[error("auth service error: {0}")]
    Service(SupabaseError),
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        let (status, message) = match &err {
            SupabaseError::Api {
                status, message, ..
            } => (*status, message.clone()),
            _ => return Self::Service(err),
        };

        let code = err.code().map(str::to_owned);
        match code.as_deref() {
            Some("invalid_credentials" | "invalid_grant") => Self::InvalidCredentials,
            Some("user_already_exists" | "email_exists") => Self::UserAlreadyExists,
            Some("weak_password") => Self::WeakPassword(message),
            Some("email_not_confirmed") => Self::EmailNotConfirmed,
            Some("bad_jwt" | "session_not_found" | "no_authorization") => Self::NotSignedIn,
            _ if status == 401 => Self::NotSignedIn,
            _ => Self::Service(err),
        }
    }
}

impl AuthError {
    /// Short message safe to show on the profile page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Enter a valid email address.".to_string(),
            Self::InvalidCredentials => "Incorrect email or password.".to_string(),
            Self::UserAlreadyExists => "An account with this email already exists.".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::EmailNotConfirmed => "Confirm your email address, then sign in.".to_string(),
            Self::NotSignedIn => "Your session has ended. Sign in again.".to_string(),
            Self::Service(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: &str) -> SupabaseError {
        SupabaseError::Api {
            status,
            code: Some(code.to_string()),
            message: "Password should be at least 6 characters.".to_string(),
        }
    }

    #[test]
    fn test_maps_gotrue_codes() {
        assert!(matches!(
            AuthError::from(api(400, "invalid_credentials")),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(api(422, "user_already_exists")),
            AuthError::UserAlreadyExists
        ));
        assert!(matches!(
            AuthError::from(api(422, "weak_password")),
            AuthError::WeakPassword(msg) if msg.contains("6 characters")
        ));
        assert!(matches!(
            AuthError::from(api(401, "something_new")),
            AuthError::NotSignedIn
        ));
    }

    #[test]
    fn test_transport_errors_stay_service_errors() {
        let err = AuthError::from(SupabaseError::RateLimited(5));
        assert!(matches!(err, AuthError::Service(_)));
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
