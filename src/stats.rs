use serde::{Deserialize, Serialize};

/// Aggregate counters shown on the progress panel.
///
/// Lives next to the engine rather than inside it: the engine only knows
/// per-item state, while combos are a property of the answer stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub total_attempts: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    /// Consecutive correct answers
    pub current_combo: u32,
    pub max_combo: u32,
    /// Number of items answered correctly at least once
    pub practiced_count: u32,
}

impl SessionStats {
    pub fn record(&mut self, correct: bool) {
        self.total_attempts = self.total_attempts.saturating_add(1);

        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.current_combo = self.current_combo.saturating_add(1);
            self.max_combo = self.max_combo.max(self.current_combo);
        } else {
            self.wrong_count = self.wrong_count.saturating_add(1);
            self.current_combo = 0;
        }
    }

    /// Correct answers as a percentage of attempts, 0 before the first attempt
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.total_attempts as f64 * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
