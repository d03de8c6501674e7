//! State remembered per device between visits.

use serde::{Deserialize, Serialize};

use crate::types::FilterState;

/// Storage key for the onboarding-finished flag.
pub const ONBOARDED_KEY: &str = "rentswipe_onboarded";
/// Storage key for the saved filter state.
pub const FILTERS_KEY: &str = "rentswipe_filters";

/// What a device remembers: whether the wizard was completed and the last
/// applied filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub onboarded: bool,
    pub filters: FilterState,
}

impl DeviceState {
    /// Rebuild from the two stored entries; missing ones fall back to a
    /// fresh device.
    #[must_use]
    pub fn from_stored(onboarded: Option<bool>, filters: Option<FilterState>) -> Self {
        Self {
            onboarded: onboarded.unwrap_or(false),
            filters: filters.unwrap_or_else(FilterState::initial),
        }
    }

    /// Mark onboarding complete with the wizard's result.
    pub fn complete_onboarding(&mut self, filters: FilterState) {
        self.onboarded = true;
        self.filters = filters;
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::from_stored(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_device() {
        let state = DeviceState::default();
        assert!(!state.onboarded);
        assert_eq!(state.filters, FilterState::initial());
    }

    #[test]
    fn test_complete_onboarding() {
        let mut state = DeviceState::default();
        state.complete_onboarding(FilterState::onboarding_draft());
        assert!(state.onboarded);
        assert_eq!(state.filters, FilterState::onboarding_draft());
    }
}
