use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_CANDIDATE_POOL;

/// Default transition guard window in milliseconds
pub const DEFAULT_TRANSITION_GUARD_MS: i64 = 300;

/// Default storage key for the progress document
pub const DEFAULT_STORAGE_KEY: &str = "zigen_drill_progress";

/// Drill configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrillOptions {
    /// Random seed for reproducible draws (system time when absent)
    pub seed: Option<u64>,
    /// Number of top-ranked items eligible for weighted sampling
    pub candidate_pool_size: usize,
    /// Answers arriving this soon after an advance are ignored
    pub transition_guard_ms: i64,
    /// Key the progress document is stored under
    pub storage_key: String,
    /// Save after every recorded answer
    pub autosave: bool,
}

impl Default for DrillOptions {
    fn default() -> Self {
        Self {
            seed: None,
            candidate_pool_size: DEFAULT_CANDIDATE_POOL,
            transition_guard_ms: DEFAULT_TRANSITION_GUARD_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave: true,
        }
    }
}

impl DrillOptions {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build options from an arbitrary variable source. Unparsable values are
    /// ignored and keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let seed = lookup("ZIGEN_DRILL_SEED").and_then(|value| value.trim().parse::<u64>().ok());

        let candidate_pool_size = lookup("ZIGEN_DRILL_CANDIDATES")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.candidate_pool_size);

        let transition_guard_ms = lookup("ZIGEN_DRILL_GUARD_MS")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|ms| *ms >= 0)
            .unwrap_or(defaults.transition_guard_ms);

        let storage_key = lookup("ZIGEN_DRILL_STORAGE_KEY")
            .map(|value| value.trim().to_string())
            .filter(|key| !key.is_empty())
            .unwrap_or(defaults.storage_key);

        let autosave = lookup("ZIGEN_DRILL_AUTOSAVE")
            .map(|value| !matches!(value.trim(), "0" | "false" | "off"))
            .unwrap_or(defaults.autosave);

        Self {
            seed,
            candidate_pool_size,
            transition_guard_ms,
            storage_key,
            autosave,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
