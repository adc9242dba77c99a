//! Label-selection policy for multi-label emotion classification.
//!
//! The classifier produces one independent sigmoid probability per class;
//! per-class thresholds are calibrated offline. This module turns a
//! probability row plus the threshold vector into the final list of 1-2
//! emotion labels shown to the user:
//!
//! - 0 or 1 classes above threshold: report the single highest-probability
//!   class, even "neutral".
//! - 2 or more classes above threshold: report the two highest-probability
//!   classes from the full ranking; if "neutral" is one of them it is
//!   dropped (never backfilled), so the result may shrink to one label.
//!
//! "Neutral" is treated as a filler that must not crowd out a genuine
//! emotion, but may stand alone when nothing more specific is indicated.
//! Note that the top-two pick deliberately ranks over all classes, not just
//! the passing ones, matching the calibrated behavior of the deployed model.

use thiserror::Error;

use crate::labels::NEUTRAL_LABEL;

/// Errors from invalid selector input. Both are caller errors; retrying
/// without fixing the inputs cannot succeed.
#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    #[error(
        "shape mismatch: {probabilities} probabilities, {thresholds} thresholds, {classes} class names"
    )]
    ShapeMismatch {
        probabilities: usize,
        thresholds: usize,
        classes: usize,
    },

    #[error("{kind} at index {index} is not a finite value in [0, 1]: {value}")]
    OutOfRange {
        kind: &'static str,
        index: usize,
        value: f32,
    },
}

/// Select the emotion labels for one probability row.
///
/// All three slices must have the same non-zero length, and every
/// probability and threshold must be finite and within [0, 1]. The result
/// holds 1 or 2 labels in descending-probability order, with no duplicates.
/// Ties rank the lower class index first.
pub fn select(
    probabilities: &[f32],
    thresholds: &[f32],
    class_names: &[&str],
) -> Result<Vec<String>, SelectError> {
    validate(probabilities, thresholds, class_names)?;

    // Stable sort keeps the original index order for equal probabilities
    let mut ranked: Vec<usize> = (0..probabilities.len()).collect();
    ranked.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Strict inequality: probability equal to its threshold does not pass
    let passing = probabilities
        .iter()
        .zip(thresholds)
        .filter(|(p, t)| p > t)
        .count();

    let take = if passing >= 2 { 2 } else { 1 };
    let mut labels: Vec<String> = ranked
        .iter()
        .take(take)
        .map(|&i| class_names[i].to_string())
        .collect();

    // Neutral is demoted only when it would crowd out another emotion,
    // and the dropped slot is never backfilled
    if labels.len() == 2 {
        labels.retain(|label| label != NEUTRAL_LABEL);
    }
    labels.dedup();

    Ok(labels)
}

/// Apply [`select`] to each row independently, preserving row order.
pub fn select_batch(
    rows: &[Vec<f32>],
    thresholds: &[f32],
    class_names: &[&str],
) -> Result<Vec<Vec<String>>, SelectError> {
    rows.iter()
        .map(|row| select(row, thresholds, class_names))
        .collect()
}

fn validate(
    probabilities: &[f32],
    thresholds: &[f32],
    class_names: &[&str],
) -> Result<(), SelectError> {
    let n = class_names.len();
    if n == 0 || probabilities.len() != n || thresholds.len() != n {
        return Err(SelectError::ShapeMismatch {
            probabilities: probabilities.len(),
            thresholds: thresholds.len(),
            classes: n,
        });
    }

    for (kind, values) in [("probability", probabilities), ("threshold", thresholds)] {
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SelectError::OutOfRange { kind, index, value });
            }
        }
    }

    Ok(())
}
