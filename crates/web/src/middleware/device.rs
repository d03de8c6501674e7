//! Per-device state extractor.
//!
//! A device is one browser session. On first sight it is given a random id,
//! which keys its discovery session. The onboarding flag and the last applied
//! filters are stored alongside it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use rentswipe_core::{DeviceId, DeviceState, FilterState};

use crate::error::AppError;
use crate::models::session_keys;

/// The requesting device and what it remembers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(device: Device) -> impl IntoResponse {
///     format!("{} onboarded: {}", device.id, device.state.onboarded)
/// }
/// ```
pub struct Device {
    pub id: DeviceId,
    pub state: DeviceState,
    session: Session,
}

impl Device {
    /// Load the device from `session`, assigning an id if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: Session) -> Result<Self, tower_sessions::session::Error> {
        let id = match session.get::<DeviceId>(session_keys::DEVICE_ID).await? {
            Some(id) => id,
            None => {
                let id = DeviceId::new(Uuid::new_v4().to_string());
                session.insert(session_keys::DEVICE_ID, &id).await?;
                tracing::debug!(device = %id, "Assigned device id");
                id
            }
        };

        let onboarded = session.get::<bool>(session_keys::ONBOARDED).await?;
        let filters = session.get::<FilterState>(session_keys::FILTERS).await?;

        Ok(Self {
            id,
            state: DeviceState::from_stored(onboarded, filters),
            session,
        })
    }

    /// Remember `filters` as the device's applied filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_filters(
        &mut self,
        filters: FilterState,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::FILTERS, &filters).await?;
        self.state.filters = filters;
        Ok(())
    }

    /// Record the wizard's result and mark the device onboarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn complete_onboarding(
        &mut self,
        filters: FilterState,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::ONBOARDED, true).await?;
        self.session.insert(session_keys::FILTERS, &filters).await?;
        self.state.complete_onboarding(filters);
        Ok(())
    }

    /// The underlying session, for other keys.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for Device
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Ok(Self::load(session).await?)
    }
}
