//! Restored-state sanitation
//!
//! Values read back from storage may come from older builds, hand-edited
//! backups or the legacy flat-weight format. Everything is clamped into the
//! ranges the engine relies on before it reaches an engine.

use crate::types::{ItemState, DEFAULT_WEIGHT, MAX_MASTERY, MAX_WEIGHT, MIN_WEIGHT};

/// Check whether a weight is usable as-is
pub fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight)
}

/// Clamp a weight into [MIN_WEIGHT, MAX_WEIGHT]; NaN and infinities fall back
/// to the default weight.
pub fn sanitize_weight(weight: f64) -> f64 {
    if !weight.is_finite() {
        return DEFAULT_WEIGHT;
    }
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Bring a stored item state back into its invariant ranges
pub fn sanitize_item_state(state: &mut ItemState) {
    state.weight = sanitize_weight(state.weight);
    state.mastery = state.mastery.min(MAX_MASTERY);
}

/// Validate an answer key: a single ASCII letter, returned uppercased
pub fn normalize_key(key: char) -> Option<char> {
    key.is_ascii_alphabetic().then(|| key.to_ascii_uppercase())
}
