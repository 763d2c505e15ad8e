//! crates/study_core/src/gesture.rs
//!
//! Turns a completed drag on the card into a study intent.

use crate::domain::{GestureVector, Rating, StudyMode};

/// Minimum travel along the dominant axis for a drag to count as a swipe.
pub const SWIPE_THRESHOLD: f64 = 80.0;

/// Sideways travel that tilts a downward swipe towards `Again` or `Easy`.
pub const DIAGONAL_THRESHOLD: f64 = 30.0;

/// What a gesture asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIntent {
    Rate(Rating),
    Advance,
    None,
}

impl GestureIntent {
    /// Practice sessions carry no rating semantics, so any rating becomes a plain advance.
    pub fn for_mode(self, mode: StudyMode) -> Self {
        match (self, mode) {
            (GestureIntent::Rate(_), StudyMode::Free) => GestureIntent::Advance,
            (intent, _) => intent,
        }
    }
}

/// Interprets a finished drag. Pure; the caller decides what to do with the intent.
///
/// An unflipped card never yields a rating: short taps on the front are flips,
/// which the caller handles itself.
pub fn interpret_gesture(vector: GestureVector, is_flipped: bool) -> GestureIntent {
    if !is_flipped {
        return GestureIntent::None;
    }

    let GestureVector { delta_x, delta_y } = vector;
    let abs_x = delta_x.abs();
    let abs_y = delta_y.abs();

    if abs_y > abs_x && delta_y > SWIPE_THRESHOLD {
        // Downward swipe, tilted by the sideways component.
        return if delta_x > DIAGONAL_THRESHOLD {
            GestureIntent::Rate(Rating::Easy)
        } else {
            GestureIntent::Rate(Rating::Again)
        };
    }

    if abs_x > SWIPE_THRESHOLD && abs_x > abs_y {
        return if delta_x < 0.0 {
            GestureIntent::Rate(Rating::Hard)
        } else {
            GestureIntent::Rate(Rating::Good)
        };
    }

    GestureIntent::None
}
