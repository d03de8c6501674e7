//! First-run wizard.
//!
//! Four steps collect a [`FilterState`]: a welcome screen, the location, the
//! budget and the essentials (rooms and parking). The wizard is serializable
//! so the draft can live in the visitor's session between requests.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::FilterState;

/// Budget slider bounds and step, in currency units.
pub const BUDGET_MIN: u32 = 500;
pub const BUDGET_MAX: u32 = 10_000;
pub const BUDGET_STEP: u32 = 100;

/// A wizard step, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStep {
    Welcome,
    Location,
    Budget,
    Essentials,
}

impl OnboardingStep {
    pub const ALL: [Self; 4] = [Self::Welcome, Self::Location, Self::Budget, Self::Essentials];

    /// Zero-based position, used for the progress dots.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Welcome => 0,
            Self::Location => 1,
            Self::Budget => 2,
            Self::Essentials => 3,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Welcome => Some(Self::Location),
            Self::Location => Some(Self::Budget),
            Self::Budget => Some(Self::Essentials),
            Self::Essentials => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Welcome => None,
            Self::Location => Some(Self::Welcome),
            Self::Budget => Some(Self::Location),
            Self::Essentials => Some(Self::Budget),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Location => "location",
            Self::Budget => "budget",
            Self::Essentials => "essentials",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when the wizard was advanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Moved to this step.
    Next(OnboardingStep),
    /// Stayed put; the current step is incomplete.
    Blocked(OnboardingStep),
    /// Finished with these filters.
    Complete(FilterState),
}

/// Wizard progress plus the draft filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    draft: FilterState,
}

impl OnboardingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::Welcome,
            draft: FilterState::onboarding_draft(),
        }
    }

    #[must_use]
    pub const fn step(&self) -> OnboardingStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> &FilterState {
        &self.draft
    }

    /// Whether the current step lets the visitor continue.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        match self.step {
            OnboardingStep::Location => self.draft.location_query().is_some(),
            _ => true,
        }
    }

    /// Move forward, or finish from the last step.
    pub fn advance(&mut self) -> StepResult {
        if !self.can_advance() {
            return StepResult::Blocked(self.step);
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                StepResult::Next(next)
            }
            None => StepResult::Complete(self.draft.clone()),
        }
    }

    /// Step back; stays on the welcome step.
    pub fn back(&mut self) -> OnboardingStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.draft.location = location.into();
    }

    /// Set the budget ceiling, clamped to the slider's range and snapped to
    /// its step.
    pub fn set_max_price(&mut self, amount: u32) {
        let clamped = amount.clamp(BUDGET_MIN, BUDGET_MAX);
        let snapped = BUDGET_MIN + (clamped - BUDGET_MIN) / BUDGET_STEP * BUDGET_STEP;
        self.draft.max_price = Decimal::from(snapped);
    }

    pub fn set_beds(&mut self, beds: u32) {
        self.draft.beds = beds;
    }

    pub fn set_baths(&mut self, baths: u32) {
        self.draft.baths = baths;
    }

    /// Add `delta` bedrooms, never going below zero.
    pub fn adjust_beds(&mut self, delta: i32) {
        self.draft.beds = self.draft.beds.saturating_add_signed(delta);
    }

    /// Add `delta` bathrooms, never going below zero.
    pub fn adjust_baths(&mut self, delta: i32) {
        self.draft.baths = self.draft.baths.saturating_add_signed(delta);
    }

    pub fn set_parking_only(&mut self, parking_only: bool) {
        self.draft.parking_only = parking_only;
    }
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}
