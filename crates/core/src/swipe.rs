//! Drag gesture to swipe decision.
//!
//! The browser reports how far the front card was dragged horizontally when
//! the pointer was released; this module decides whether that was a swipe.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Horizontal displacement, in CSS pixels, a drag must reach to count.
pub const SWIPE_THRESHOLD_PX: f64 = 100.0;

/// A decision on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Reject.
    Left,
    /// Favorite.
    Right,
}

impl SwipeDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`SwipeDirection`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown swipe direction: {0}")]
pub struct ParseDirectionError(String);

impl FromStr for SwipeDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "nope" => Ok(Self::Left),
            "right" | "like" => Ok(Self::Right),
            other => Err(ParseDirectionError(other.to_owned())),
        }
    }
}

/// Resolve a released drag into a decision.
///
/// `dx` is the signed horizontal displacement at release. Anything short of
/// the threshold in either direction is not a decision and the card springs
/// back. Non-finite input is treated as no movement.
///
/// ```
/// use rentswipe_core::{SwipeDirection, resolve_drag};
///
/// assert_eq!(resolve_drag(120.0), Some(SwipeDirection::Right));
/// assert_eq!(resolve_drag(-80.0), None);
/// ```
#[must_use]
pub fn resolve_drag(dx: f64) -> Option<SwipeDirection> {
    if !dx.is_finite() {
        return None;
    }
    if dx >= SWIPE_THRESHOLD_PX {
        Some(SwipeDirection::Right)
    } else if dx <= -SWIPE_THRESHOLD_PX {
        Some(SwipeDirection::Left)
    } else {
        None
    }
}
