//! Drill session orchestration
//!
//! Ties the engine, the session counters and a progress store together the
//! way the drill page uses them: advance to an item, accept one answer for
//! it, record the outcome and autosave. Time is passed in as epoch
//! milliseconds so the transition guard behaves the same natively, in tests
//! and in the browser.

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::DrillOptions;
use crate::engine::SelectionEngine;
use crate::sanitize::normalize_key;
use crate::stats::SessionStats;
use crate::storage::{KeyValueStore, ProgressDocument, ProgressStore, StorageResult};
use crate::types::{CatalogItem, LearningStats};

// ==================== Transition Guard ====================

/// Ignores answers for a short window after each advance so that a fast
/// keypress cannot land on the freshly drawn item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionGuard {
    window_ms: i64,
    blocked_until: Option<i64>,
}

impl TransitionGuard {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(0),
            blocked_until: None,
        }
    }

    pub fn begin(&mut self, now_ms: i64) {
        self.blocked_until = Some(now_ms.saturating_add(self.window_ms));
    }

    pub fn is_blocking(&self, now_ms: i64) -> bool {
        matches!(self.blocked_until, Some(until) if now_ms < until)
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }
}

// ==================== Answer Outcome ====================

/// Result of submitting a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AnswerOutcome {
    /// Arrived inside the transition window
    Ignored,
    /// Not an ASCII letter; the current item stays active
    InvalidKey { pressed: char },
    /// No item is waiting for an answer
    NoActiveItem,
    Correct { item: CatalogItem },
    Wrong { item: CatalogItem, pressed: char },
}

impl AnswerOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Correct { .. } | Self::Wrong { .. })
    }
}

// ==================== Session ====================

/// One interactive drill over a catalog, backed by a key-value store
pub struct DrillSession<S: KeyValueStore> {
    engine: SelectionEngine,
    stats: SessionStats,
    store: ProgressStore<S>,
    guard: TransitionGuard,
    current: Option<CatalogItem>,
    last_practice_time: Option<String>,
    autosave: bool,
}

impl<S: KeyValueStore> DrillSession<S> {
    /// Open a session and restore whatever progress the store holds
    pub fn open(catalog: Catalog, options: &DrillOptions, backend: S) -> Self {
        let store = ProgressStore::new(backend, options.storage_key.clone());
        let document = store.load();

        let mut session = Self {
            engine: SelectionEngine::with_options(catalog, options),
            stats: SessionStats::default(),
            store,
            guard: TransitionGuard::new(options.transition_guard_ms),
            current: None,
            last_practice_time: None,
            autosave: options.autosave,
        };
        session.apply_document(document);
        session
    }

    fn apply_document(&mut self, document: ProgressDocument) {
        self.engine.restore(document.to_snapshot());
        self.stats = document.stats;
        self.stats.practiced_count = self.engine.seen_count() as u32;
        self.last_practice_time = document.last_practice_time;
        self.current = None;
    }

    // ==================== Drill Flow ====================

    /// Draw the next item and start the transition window
    pub fn advance(&mut self, now_ms: i64) -> CatalogItem {
        self.guard.begin(now_ms);
        let item = self.engine.next_item();
        self.current = Some(item.clone());
        item
    }

    /// Answer the current item with `key`
    pub fn submit(&mut self, key: char, now_ms: i64) -> AnswerOutcome {
        if self.guard.is_blocking(now_ms) {
            log::debug!("answer {:?} ignored inside transition window", key);
            return AnswerOutcome::Ignored;
        }

        let Some(pressed) = normalize_key(key) else {
            return AnswerOutcome::InvalidKey { pressed: key };
        };

        let Some(item) = self.current.take() else {
            return AnswerOutcome::NoActiveItem;
        };

        let correct = item.is_answered_by(pressed);
        if correct {
            self.engine.record_correct(&item.id);
        } else {
            self.engine.record_wrong(&item.id);
        }

        self.stats.record(correct);
        self.stats.practiced_count = self.engine.seen_count() as u32;
        self.last_practice_time = Utc
            .timestamp_millis_opt(now_ms)
            .single()
            .map(|time| time.to_rfc3339());

        if self.autosave {
            self.save();
        }

        if correct {
            AnswerOutcome::Correct { item }
        } else {
            AnswerOutcome::Wrong { item, pressed }
        }
    }

    // ==================== Persistence ====================

    /// Current progress as a document
    pub fn document(&self) -> ProgressDocument {
        ProgressDocument::capture(&self.engine, &self.stats, self.last_practice_time.clone())
    }

    /// Save now; failures are logged and reported as `false`, in-memory
    /// progress is kept either way.
    pub fn save(&mut self) -> bool {
        let document = self.document();
        match self.store.save(&document) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to save progress: {}", e);
                false
            }
        }
    }

    /// Save on page hide or unload
    pub fn flush(&mut self) -> bool {
        self.save()
    }

    /// Forget all progress and persist the empty state
    pub fn reset_progress(&mut self) -> bool {
        self.engine.reset();
        self.stats.reset();
        self.current = None;
        self.last_practice_time = None;
        self.save()
    }

    /// Pretty-printed backup of the current progress
    pub fn export_json(&self) -> StorageResult<String> {
        self.document().to_pretty_json()
    }

    /// Replace current progress with a backup.
    ///
    /// Text that is not JSON is rejected and leaves the session untouched.
    /// Otherwise the backup is applied in memory and the result tells whether
    /// it was also persisted.
    pub fn import_json(&mut self, text: &str) -> StorageResult<bool> {
        let document = ProgressDocument::from_json_str(text)?;
        self.apply_document(document);
        log::info!(
            "imported progress: {} of {} items seen",
            self.engine.seen_count(),
            self.engine.total_count()
        );
        Ok(self.save())
    }

    // ==================== Accessors ====================

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SelectionEngine {
        &mut self.engine
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn learning_stats(&self) -> LearningStats {
        self.engine.learning_stats()
    }

    pub fn current(&self) -> Option<&CatalogItem> {
        self.current.as_ref()
    }

    pub fn last_practice_time(&self) -> Option<&str> {
        self.last_practice_time.as_deref()
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }
}

// ==================== Unit Tests ====================
