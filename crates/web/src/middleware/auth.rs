//! Authentication extractors.
//!
//! The signed-in user's Supabase session lives in the tower session. An
//! expired session counts as signed out.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::session_keys;
use crate::supabase::AuthSession;

/// Extractor for the signed-in user, if any.
///
/// Pages here work signed out too, so this never rejects.
pub struct OptionalUser(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(auth))
    }
}

async fn current_user(session: &Session) -> Option<AuthSession> {
    let auth = session
        .get::<AuthSession>(session_keys::AUTH_SESSION)
        .await
        .ok()
        .flatten()?;

    if auth.is_expired() {
        tracing::debug!(user_id = %auth.user.id, "Stored auth session expired");
        return None;
    }
    Some(auth)
}

/// Store the signed-in user's session.
///
/// The session id is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Replace the stored user without cycling the session, e.g. after a
/// metadata update.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_current_user(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Remove the signed-in user from the session (sign out).
///
/// Device state (onboarding flag, filters, discovery session) is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthSession>(session_keys::AUTH_SESSION)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use rentswipe_core::{User, UserId, UserMetadata};

    use super::*;

    fn auth(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            user: User::from_parts(UserId::new("u-1"), None, UserMetadata::default()),
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_current_user_roundtrip() {
        let session = session();
        assert!(current_user(&session).await.is_none());

        let stored = auth(chrono::Utc::now().timestamp() + 3600);
        update_current_user(&session, &stored).await.unwrap();
        assert_eq!(current_user(&session).await.unwrap().user.id, stored.user.id);

        clear_current_user(&session).await.unwrap();
        assert!(current_user(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_signed_out() {
        let session = session();
        update_current_user(&session, &auth(chrono::Utc::now().timestamp() - 10))
            .await
            .unwrap();

        assert!(current_user(&session).await.is_none());
    }
}
