//! Gesture classification.
//!
//! The UI layer reports a horizontal swipe delta; classification into a
//! review action is a pure function so it stays out of the engine.

use serde::{Deserialize, Serialize};

/// A classified swipe gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    /// Keep the current item and advance.
    Skip,

    /// Soft-delete the current item and advance.
    Trash,

    /// Below threshold, no action.
    None,
}

/// Classify a horizontal swipe delta against a threshold.
///
/// Right of `threshold` is a skip, left of `-threshold` is a trash,
/// anything in between is no action. A non-positive threshold disables
/// classification entirely; without that, a zero threshold would turn a
/// motionless pointer into a skip.
pub fn classify(delta_x: f32, threshold: f32) -> Gesture {
    if threshold <= 0.0 {
        return Gesture::None;
    }
    if delta_x >= threshold {
        Gesture::Skip
    } else if delta_x <= -threshold {
        Gesture::Trash
    } else {
        Gesture::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_directions() {
        assert_eq!(classify(120.0, 80.0), Gesture::Skip);
        assert_eq!(classify(-120.0, 80.0), Gesture::Trash);
        assert_eq!(classify(30.0, 80.0), Gesture::None);
        assert_eq!(classify(-30.0, 80.0), Gesture::None);
    }

    #[test]
    fn test_classify_boundary_is_inclusive() {
        assert_eq!(classify(80.0, 80.0), Gesture::Skip);
        assert_eq!(classify(-80.0, 80.0), Gesture::Trash);
    }

    #[test]
    fn test_classify_non_positive_threshold_never_fires() {
        assert_eq!(classify(0.0, 0.0), Gesture::None);
        assert_eq!(classify(120.0, 0.0), Gesture::None);
        assert_eq!(classify(120.0, -80.0), Gesture::None);
        assert_eq!(classify(-120.0, -80.0), Gesture::None);
    }
}
