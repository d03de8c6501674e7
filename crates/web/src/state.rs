//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::DiscoveryService;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// Supabase client, the per-device discovery sessions and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    supabase: SupabaseClient,
    discovery: DiscoveryService<SupabaseClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built from the
    /// configuration.
    pub fn new(config: AppConfig) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let discovery = DiscoveryService::new(supabase.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                discovery,
            }),
        })
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Get a reference to the discovery sessions.
    #[must_use]
    pub fn discovery(&self) -> &DiscoveryService<SupabaseClient> {
        &self.inner.discovery
    }
}
