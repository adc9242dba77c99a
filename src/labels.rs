//! Fixed emotion class registry.
//!
//! Index order matches the output head of the trained classifier and the
//! calibrated threshold file. Never reordered at runtime.

/// Emotion class names, in model output order
pub const EMOTION_CLASSES: [&str; 8] = [
    "angry",
    "sad",
    "anxious",
    "happy",
    "curious",
    "confused",
    "surprised",
    "neutral",
];

/// The filler label that is demoted whenever another emotion is reported
pub const NEUTRAL_LABEL: &str = "neutral";

/// Number of emotion classes
pub const NUM_CLASSES: usize = EMOTION_CLASSES.len();
