//! Filter editor route handlers.
//!
//! Applying filters stores them for the device, restarts discovery from
//! page 0 with an empty decided set, and saves them as the signed-in user's
//! preferences.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use rentswipe_core::{FilterState, MAX_RADIUS_KM, MIN_RADIUS_KM};

use super::profile::save_preferences_best_effort;
use crate::error::Result;
use crate::filters;
use crate::middleware::{Device, OptionalUser};
use crate::state::AppState;

/// Bedroom choices offered by the editor; 0 means any.
const BED_CHOICES: [u32; 4] = [0, 1, 2, 3];
/// Bathroom choices offered by the editor; 0 means any.
const BATH_CHOICES: [u32; 3] = [0, 1, 2];

// =============================================================================
// Form Types
// =============================================================================

/// Filter form data. Fields arrive as text so bad input can be re-rendered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub radius: String,
    #[serde(default)]
    pub min_price: String,
    #[serde(default)]
    pub max_price: String,
    #[serde(default)]
    pub beds: String,
    #[serde(default)]
    pub baths: String,
    /// Checkbox: present when ticked.
    pub parking_only: Option<String>,
}

impl From<&FilterState> for FilterForm {
    fn from(filters: &FilterState) -> Self {
        Self {
            location: filters.location.clone(),
            radius: filters.radius.to_string(),
            min_price: filters.min_price.normalize().to_string(),
            max_price: filters.max_price.normalize().to_string(),
            beds: filters.beds.to_string(),
            baths: filters.baths.to_string(),
            parking_only: filters.parking_only.then(|| "on".to_string()),
        }
    }
}

impl FilterForm {
    /// Parse and validate into a [`FilterState`].
    ///
    /// Returns a message for the form on failure.
    fn parse(&self) -> std::result::Result<FilterState, String> {
        let filters = FilterState {
            min_price: parse_price(&self.min_price, "Min price")?,
            max_price: parse_price(&self.max_price, "Max price")?,
            beds: parse_count(&self.beds, "Bedrooms")?,
            baths: parse_count(&self.baths, "Bathrooms")?,
            parking_only: self.parking_only.is_some(),
            location: self.location.clone(),
            radius: parse_count(&self.radius, "Radius")?,
        };
        filters.validate().map_err(|e| capitalize(&e.to_string()))?;
        Ok(filters)
    }

    fn parking_checked(&self) -> bool {
        self.parking_only.is_some()
    }
}

fn parse_price(value: &str, label: &str) -> std::result::Result<Decimal, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let price: Decimal = value
        .parse()
        .map_err(|_| format!("{label} must be a number."))?;
    if price.is_sign_negative() {
        return Err(format!("{label} cannot be negative."));
    }
    Ok(price)
}

fn parse_count(value: &str, label: &str) -> std::result::Result<u32, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| format!("{label} must be a whole number of zero or more."))
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}

// =============================================================================
// Templates
// =============================================================================

/// One option of a room-count toggle.
#[derive(Clone)]
pub struct Choice {
    pub value: u32,
    pub label: String,
    pub selected: bool,
}

fn choices(options: &[u32], current: &str) -> Vec<Choice> {
    options
        .iter()
        .map(|&value| Choice {
            value,
            label: if value == 0 {
                "Any".to_string()
            } else {
                format!("{value}+")
            },
            selected: current.trim() == value.to_string(),
        })
        .collect()
}

/// Filter editor template.
#[derive(Template, WebTemplate)]
#[template(path = "filters.html")]
pub struct FiltersTemplate {
    pub form: FilterForm,
    pub parking_checked: bool,
    pub error: Option<String>,
    pub bed_choices: Vec<Choice>,
    pub bath_choices: Vec<Choice>,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl FiltersTemplate {
    fn new(form: FilterForm, error: Option<String>) -> Self {
        Self {
            parking_checked: form.parking_checked(),
            bed_choices: choices(&BED_CHOICES, &form.beds),
            bath_choices: choices(&BATH_CHOICES, &form.baths),
            form,
            error,
            min_radius: MIN_RADIUS_KM,
            max_radius: MAX_RADIUS_KM,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the filter editor with the device's current filters.
pub async fn show(device: Device) -> impl IntoResponse {
    FiltersTemplate::new(FilterForm::from(&device.state.filters), None)
}

/// Apply submitted filters.
#[instrument(skip(state, device, user, form), fields(device = %device.id))]
pub async fn apply(
    State(state): State<AppState>,
    mut device: Device,
    OptionalUser(user): OptionalUser,
    Form(form): Form<FilterForm>,
) -> Result<Response> {
    let filters = match form.parse() {
        Ok(filters) => filters,
        Err(message) => {
            tracing::debug!(%message, "Rejected filter form");
            return Ok((
                StatusCode::BAD_REQUEST,
                FiltersTemplate::new(form, Some(message)),
            )
                .into_response());
        }
    };

    device.save_filters(filters.clone()).await?;
    state.discovery().restart(&device.id, filters.clone()).await;

    if let Some(auth) = user {
        save_preferences_best_effort(&state, device.session(), &auth, &filters).await;
    }

    Ok(Redirect::to("/discover").into_response())
}
