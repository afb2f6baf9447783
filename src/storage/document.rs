//! Progress document
//!
//! The single JSON blob the drill persists. Loading is deliberately lenient:
//! every top-level field is read on its own and falls back to its default when
//! missing or malformed, and `weights` accepts both the current per-item
//! objects and the legacy flat `id -> weight` map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StorageResult;
use crate::engine::{ProgressSnapshot, SelectionEngine};
use crate::stats::SessionStats;
use crate::types::{ItemState, PROGRESS_VERSION};

/// Persisted drill progress
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    pub stats: SessionStats,
    /// Item id -> learning state
    pub weights: BTreeMap<String, ItemState>,
    /// Ids answered correctly at least once
    pub practiced_radicals: Vec<String>,
    /// RFC 3339 timestamp of the last recorded answer
    pub last_practice_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_counter: Option<u64>,
    pub version: u32,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self {
            stats: SessionStats::default(),
            weights: BTreeMap::new(),
            practiced_radicals: Vec::new(),
            last_practice_time: None,
            draw_counter: None,
            version: PROGRESS_VERSION,
        }
    }
}

impl ProgressDocument {
    /// Capture the current engine and session counters
    pub fn capture(
        engine: &SelectionEngine,
        stats: &SessionStats,
        last_practice_time: Option<String>,
    ) -> Self {
        let snapshot = engine.snapshot();
        Self {
            stats: stats.clone(),
            weights: snapshot.items,
            practiced_radicals: snapshot.seen,
            last_practice_time,
            draw_counter: snapshot.draw_counter,
            version: PROGRESS_VERSION,
        }
    }

    /// Engine-facing view of the document
    pub fn to_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            items: self.weights.clone(),
            seen: self.practiced_radicals.clone(),
            draw_counter: self.draw_counter,
        }
    }

    // ==================== Lenient Loading ====================

    /// Merge a stored JSON value over the defaults, field by field
    pub fn from_value(value: &Value) -> Self {
        let mut doc = Self::default();

        let Some(object) = value.as_object() else {
            log::warn!("progress document is not a JSON object, using defaults");
            return doc;
        };

        // Oldest backups were nothing but the flat weight map
        if is_bare_weight_map(object) {
            log::info!("upgrading bare legacy weight map ({} entries)", object.len());
            for (id, entry) in object {
                if let Some(state) = parse_weight_entry(entry) {
                    doc.weights.insert(id.clone(), state);
                }
            }
            return doc;
        }

        if let Some(stats) = object.get("stats") {
            match SessionStats::deserialize(stats) {
                Ok(parsed) => doc.stats = parsed,
                Err(e) => log::warn!("ignoring malformed stats: {}", e),
            }
        }

        if let Some(weights) = object.get("weights") {
            match weights.as_object() {
                Some(entries) => {
                    for (id, entry) in entries {
                        match parse_weight_entry(entry) {
                            Some(state) => {
                                doc.weights.insert(id.clone(), state);
                            }
                            None => log::warn!("ignoring malformed weight entry for {}", id),
                        }
                    }
                }
                None => log::warn!("ignoring malformed weights field"),
            }
        }

        if let Some(Value::Array(ids)) = object.get("practicedRadicals") {
            doc.practiced_radicals = ids
                .iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect();
        }

        if let Some(Value::String(time)) = object.get("lastPracticeTime") {
            doc.last_practice_time = Some(time.clone());
        }

        doc.draw_counter = object.get("drawCounter").and_then(Value::as_u64);

        if let Some(version) = object.get("version").and_then(Value::as_u64) {
            if version > PROGRESS_VERSION as u64 {
                log::warn!(
                    "progress document version {} is newer than {}, reading known fields only",
                    version,
                    PROGRESS_VERSION
                );
            }
            doc.version = u32::try_from(version).unwrap_or(PROGRESS_VERSION);
        }

        doc
    }

    /// Parse a stored blob; anything unreadable yields the defaults
    pub fn from_stored(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                log::warn!("stored progress is not valid JSON ({}), using defaults", e);
                Self::default()
            }
        }
    }

    // ==================== Export / Import ====================

    /// Pretty-printed JSON for manual backup
    pub fn to_pretty_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manual backup. Text that is not JSON is an error; a JSON value
    /// is merged over the defaults like a stored document.
    pub fn from_json_str(text: &str) -> StorageResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }
}

const DOCUMENT_FIELDS: &[&str] = &[
    "stats",
    "weights",
    "practicedRadicals",
    "lastPracticeTime",
    "drawCounter",
    "version",
];

/// A non-empty object of numbers with none of the document's own fields
fn is_bare_weight_map(object: &serde_json::Map<String, Value>) -> bool {
    !object.is_empty()
        && object.keys().all(|key| !DOCUMENT_FIELDS.contains(&key.as_str()))
        && object.values().all(Value::is_number)
}

/// Current shape is an object, legacy shape is a bare weight
fn parse_weight_entry(entry: &Value) -> Option<ItemState> {
    match entry {
        Value::Number(weight) => weight.as_f64().map(ItemState::from_legacy_weight),
        Value::Object(_) => ItemState::deserialize(entry).ok(),
        _ => None,
    }
}
