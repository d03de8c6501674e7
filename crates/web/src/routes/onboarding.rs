//! Onboarding wizard route handlers.
//!
//! The wizard lives in the session between steps. Finishing it stores the
//! filters for the device, marks it onboarded and loads the first page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use rentswipe_core::onboarding::{BUDGET_MAX, BUDGET_MIN, BUDGET_STEP};
use rentswipe_core::{OnboardingStep, OnboardingWizard, StepResult};

use super::profile::save_preferences_best_effort;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Device, OptionalUser};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Button pressed on a wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    Next,
    Back,
    MoreBeds,
    FewerBeds,
    MoreBaths,
    FewerBaths,
}

/// Wizard step form data. Only the current step's fields are read.
#[derive(Debug, Deserialize)]
pub struct WizardForm {
    pub action: WizardAction,
    pub location: Option<String>,
    pub max_price: Option<u32>,
    pub parking_only: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Wizard step template.
#[derive(Template, WebTemplate)]
#[template(path = "onboarding.html")]
pub struct OnboardingTemplate {
    pub step: &'static str,
    /// 1-based, for the progress dots.
    pub step_number: usize,
    pub step_count: usize,
    /// One entry per step; `true` up to and including the current one.
    pub progress: Vec<bool>,
    pub location: String,
    pub max_price: String,
    pub beds: u32,
    pub baths: u32,
    pub parking_only: bool,
    pub can_advance: bool,
    pub is_last: bool,
    pub error: Option<String>,
    pub budget_min: u32,
    pub budget_max: u32,
    pub budget_step: u32,
}

impl OnboardingTemplate {
    fn new(wizard: &OnboardingWizard, error: Option<String>) -> Self {
        let draft = wizard.draft();
        Self {
            step: wizard.step().as_str(),
            step_number: wizard.step().index() + 1,
            step_count: OnboardingStep::ALL.len(),
            progress: OnboardingStep::ALL
                .iter()
                .map(|s| s.index() <= wizard.step().index())
                .collect(),
            location: draft.location.clone(),
            max_price: draft.max_price.normalize().to_string(),
            beds: draft.beds,
            baths: draft.baths,
            parking_only: draft.parking_only,
            can_advance: wizard.can_advance(),
            is_last: wizard.step() == OnboardingStep::Essentials,
            error,
            budget_min: BUDGET_MIN,
            budget_max: BUDGET_MAX,
            budget_step: BUDGET_STEP,
        }
    }
}

// =============================================================================
// Wizard Logic
// =============================================================================

/// What a submitted step leads to.
#[derive(Debug)]
enum Submission {
    /// Show the wizard again, with an optional message.
    Render(Option<String>),
    /// The wizard is done with these filters.
    Complete(rentswipe_core::FilterState),
}

/// Apply a submitted step to `wizard`.
fn submit(wizard: &mut OnboardingWizard, form: &WizardForm) -> Submission {
    match wizard.step() {
        OnboardingStep::Location => {
            if let Some(location) = &form.location {
                wizard.set_location(location.trim());
            }
        }
        OnboardingStep::Budget => {
            if let Some(max_price) = form.max_price {
                wizard.set_max_price(max_price);
            }
        }
        OnboardingStep::Essentials => wizard.set_parking_only(form.parking_only.is_some()),
        OnboardingStep::Welcome => {}
    }

    match form.action {
        WizardAction::Back => {
            wizard.back();
        }
        WizardAction::MoreBeds => wizard.adjust_beds(1),
        WizardAction::FewerBeds => wizard.adjust_beds(-1),
        WizardAction::MoreBaths => wizard.adjust_baths(1),
        WizardAction::FewerBaths => wizard.adjust_baths(-1),
        WizardAction::Next => match wizard.advance() {
            StepResult::Next(_) => {}
            StepResult::Blocked(_) => {
                return Submission::Render(Some("Enter a city to continue.".to_string()));
            }
            StepResult::Complete(filters) => return Submission::Complete(filters),
        },
    }
    Submission::Render(None)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the current wizard step.
pub async fn show(device: Device) -> Result<Response> {
    if device.state.onboarded {
        return Ok(Redirect::to("/discover").into_response());
    }

    let wizard = device
        .session()
        .get::<OnboardingWizard>(session_keys::ONBOARDING_WIZARD)
        .await?
        .unwrap_or_default();

    Ok(OnboardingTemplate::new(&wizard, None).into_response())
}

/// Handle a wizard step submission.
#[instrument(skip(state, device, user, form), fields(device = %device.id, action = ?form.action))]
pub async fn submit_step(
    State(state): State<AppState>,
    mut device: Device,
    OptionalUser(user): OptionalUser,
    Form(form): Form<WizardForm>,
) -> Result<Response> {
    if device.state.onboarded {
        return Ok(Redirect::to("/discover").into_response());
    }

    let session = device.session().clone();
    let mut wizard = session
        .get::<OnboardingWizard>(session_keys::ONBOARDING_WIZARD)
        .await?
        .unwrap_or_default();

    match submit(&mut wizard, &form) {
        Submission::Render(error) => {
            session
                .insert(session_keys::ONBOARDING_WIZARD, &wizard)
                .await?;
            Ok(OnboardingTemplate::new(&wizard, error).into_response())
        }
        Submission::Complete(filters) => {
            session
                .remove::<OnboardingWizard>(session_keys::ONBOARDING_WIZARD)
                .await?;
            device.complete_onboarding(filters.clone()).await?;
            tracing::info!(location = %filters.location, "Onboarding complete");

            state.discovery().restart(&device.id, filters.clone()).await;

            if let Some(auth) = user {
                save_preferences_best_effort(&state, &session, &auth, &filters).await;
            }

            Ok(Redirect::to("/discover").into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn form(action: WizardAction) -> WizardForm {
        WizardForm {
            action,
            location: None,
            max_price: None,
            parking_only: None,
        }
    }

    #[test]
    fn test_location_required() {
        let mut wizard = OnboardingWizard::new();
        submit(&mut wizard, &form(WizardAction::Next));
        assert_eq!(wizard.step(), OnboardingStep::Location);

        let blank = WizardForm {
            location: Some("   ".to_string()),
            ..form(WizardAction::Next)
        };
        assert!(matches!(
            submit(&mut wizard, &blank),
            Submission::Render(Some(_))
        ));
        assert_eq!(wizard.step(), OnboardingStep::Location);
    }

    #[test]
    fn test_full_walkthrough() {
        let mut wizard = OnboardingWizard::new();
        submit(&mut wizard, &form(WizardAction::Next));
        submit(
            &mut wizard,
            &WizardForm {
                location: Some("Austin".to_string()),
                ..form(WizardAction::Next)
            },
        );
        submit(
            &mut wizard,
            &WizardForm {
                max_price: Some(2450),
                ..form(WizardAction::Next)
            },
        );
        assert_eq!(wizard.step(), OnboardingStep::Essentials);

        submit(&mut wizard, &form(WizardAction::MoreBeds));
        submit(&mut wizard, &form(WizardAction::FewerBaths));
        submit(&mut wizard, &form(WizardAction::FewerBaths));

        let done = submit(
            &mut wizard,
            &WizardForm {
                parking_only: Some("on".to_string()),
                ..form(WizardAction::Next)
            },
        );

        let Submission::Complete(filters) = done else {
            panic!("expected completion, got {done:?}");
        };
        assert_eq!(filters.location, "Austin");
        assert_eq!(filters.max_price, Decimal::from(2400));
        assert_eq!(filters.beds, 2);
        assert_eq!(filters.baths, 0);
        assert!(filters.parking_only);
    }

    #[test]
    fn test_back_keeps_draft() {
        let mut wizard = OnboardingWizard::new();
        submit(&mut wizard, &form(WizardAction::Next));
        submit(
            &mut wizard,
            &WizardForm {
                location: Some("Denver".to_string()),
                ..form(WizardAction::Back)
            },
        );

        assert_eq!(wizard.step(), OnboardingStep::Welcome);
        assert_eq!(wizard.draft().location, "Denver");
    }

    #[test]
    fn test_essentials_checkbox_off_when_absent() {
        let mut wizard = OnboardingWizard::new();
        wizard.set_parking_only(true);
        submit(&mut wizard, &form(WizardAction::Next));
        // Not on the essentials step yet, so the flag is untouched.
        assert!(wizard.draft().parking_only);
    }
}
