use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Initial weight of an item that has never been answered
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Weight floor reached by repeated correct answers
pub const MIN_WEIGHT: f64 = 0.3;
/// Weight ceiling reached by repeated wrong answers
pub const MAX_WEIGHT: f64 = 5.0;
/// Multiplicative decay applied on a correct answer
pub const CORRECT_WEIGHT_FACTOR: f64 = 0.7;
/// Additive penalty applied on a wrong answer
pub const WRONG_WEIGHT_PENALTY: f64 = 1.5;

/// Mastery streak cap
pub const MAX_MASTERY: u32 = 5;
/// Mastery at or above which a seen item counts as mastered
pub const MASTERED_THRESHOLD: u32 = 3;
/// Lifetime wrong answers at or above which an item counts as difficult
pub const DIFFICULT_WRONG_COUNT: u32 = 3;

/// Bonus for items that were never answered correctly
pub const UNSEEN_BONUS: f64 = 100.0;
/// Points per missing mastery level
pub const MASTERY_GAP_SCALE: f64 = 10.0;
/// Points per unit of weight
pub const WEIGHT_SCALE: f64 = 5.0;
/// Cap on the overdue bonus
pub const MAX_OVERDUE_BONUS: f64 = 20.0;
/// Upper bound (exclusive) of the tie-breaking jitter
pub const JITTER_RANGE: f64 = 5.0;

/// Default number of top-ranked items eligible for weighted sampling
pub const DEFAULT_CANDIDATE_POOL: usize = 5;

/// Current progress document schema version
pub const PROGRESS_VERSION: u32 = 1;

// ==================== Catalog ====================

/// One drillable component: the glyph shown to the learner and the key that
/// produces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Stable identifier, `"{key}_{char}"`
    pub id: String,
    /// Display glyph
    #[serde(rename = "char")]
    pub glyph: String,
    /// Uppercase ASCII letter that is the correct answer
    pub key: char,
}

impl CatalogItem {
    pub fn new(key: char, glyph: &str) -> Self {
        let key = key.to_ascii_uppercase();
        Self {
            id: Self::make_id(key, glyph),
            glyph: glyph.to_string(),
            key,
        }
    }

    pub fn make_id(key: char, glyph: &str) -> String {
        format!("{}_{}", key.to_ascii_uppercase(), glyph)
    }

    /// Case-insensitive answer check
    pub fn is_answered_by(&self, key: char) -> bool {
        self.key.eq_ignore_ascii_case(&key)
    }
}

// ==================== Learning State ====================

/// Per-item learning state.
///
/// Every field defaults independently so that partially written documents
/// can be merged over a fresh state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemState {
    /// Sampling weight in [MIN_WEIGHT, MAX_WEIGHT]
    pub weight: f64,
    /// Correct-answer streak in [0, MAX_MASTERY]; any miss resets it
    pub mastery: u32,
    /// Draw counter value at the last answer, 0 = never answered
    pub last_seen_counter: u64,
    pub wrong_count: u32,
    pub correct_count: u32,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            mastery: 0,
            last_seen_counter: 0,
            wrong_count: 0,
            correct_count: 0,
        }
    }
}

impl ItemState {
    /// Upgrade a legacy flat weight entry
    pub fn from_legacy_weight(weight: f64) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }

    pub fn apply_correct(&mut self, counter: u64) {
        self.mastery = (self.mastery + 1).min(MAX_MASTERY);
        self.weight = (self.weight * CORRECT_WEIGHT_FACTOR).max(MIN_WEIGHT);
        self.last_seen_counter = counter;
        self.correct_count = self.correct_count.saturating_add(1);
    }

    pub fn apply_wrong(&mut self, counter: u64) {
        self.mastery = 0;
        self.weight = (self.weight + WRONG_WEIGHT_PENALTY).min(MAX_WEIGHT);
        self.last_seen_counter = counter;
        self.wrong_count = self.wrong_count.saturating_add(1);
    }

    /// Draws that must pass before the item becomes overdue: 1, 2, 4 … 32
    pub fn required_interval(&self) -> u64 {
        1u64 << self.mastery.min(MAX_MASTERY)
    }

    pub fn is_difficult(&self) -> bool {
        self.wrong_count >= DIFFICULT_WRONG_COUNT
    }
}

/// Partition of the catalog by learning progress.
///
/// `mastered + learning + new_items` always equals the catalog size;
/// `difficult` is counted independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    /// Seen and mastery >= MASTERED_THRESHOLD
    pub mastered: usize,
    /// Seen and mastery below the threshold
    pub learning: usize,
    /// Never answered correctly
    #[serde(rename = "new")]
    pub new_items: usize,
    /// Wrong at least DIFFICULT_WRONG_COUNT times
    pub difficult: usize,
}
