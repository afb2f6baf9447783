use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::types::ItemState;

/// Mutable engine state, one instance per drill session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    /// Learning state per catalog id
    pub items: BTreeMap<String, ItemState>,
    /// Global draw counter, incremented once per draw
    pub draw_counter: u64,
    /// Id returned by the previous draw
    pub previous_id: Option<String>,
    /// Ids answered correctly at least once
    pub seen: BTreeSet<String>,
}

impl EngineState {
    /// Default state for every catalog item
    pub fn fresh(catalog: &Catalog) -> Self {
        Self {
            items: catalog
                .all_items()
                .iter()
                .map(|item| (item.id.clone(), ItemState::default()))
                .collect(),
            draw_counter: 0,
            previous_id: None,
            seen: BTreeSet::new(),
        }
    }
}

/// Persistable subset of [`EngineState`].
///
/// Produced by `SelectionEngine::snapshot` and consumed by
/// `SelectionEngine::restore`. Ids may be stale when read from storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub items: BTreeMap<String, ItemState>,
    pub seen: Vec<String>,
    /// Absent in documents written before the counter was persisted
    pub draw_counter: Option<u64>,
}
