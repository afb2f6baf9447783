//! Selection & scoring engine
//!
//! Core principles:
//! - Every item gets a priority score on every draw: unseen items first, then
//!   low-mastery and heavy items, plus a bonus for items overdue on their
//!   exponential review interval
//! - The top few items are sampled proportionally to their scores, so the
//!   drill stays varied without drifting away from weak items
//! - The previously drawn item is never returned twice in a row when there is
//!   an alternative
//!
//! Randomness comes from a seedable ChaCha8 generator so that tests and
//! replays are deterministic.

mod state;

pub use state::{EngineState, ProgressSnapshot};

use std::cmp::Ordering;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::catalog::Catalog;
use crate::config::DrillOptions;
use crate::sanitize::sanitize_item_state;
use crate::types::{
    CatalogItem, ItemState, LearningStats, JITTER_RANGE, MASTERED_THRESHOLD, MASTERY_GAP_SCALE,
    MAX_MASTERY, MAX_OVERDUE_BONUS, UNSEEN_BONUS, WEIGHT_SCALE,
};

// ==================== Scoring ====================

/// Deterministic part of an item's priority (everything except jitter)
pub fn priority_score(state: &ItemState, seen: bool, draw_counter: u64) -> f64 {
    let mut score = 0.0;

    if !seen {
        score += UNSEEN_BONUS;
    }

    let mastery_gap = MAX_MASTERY - state.mastery.min(MAX_MASTERY);
    score += mastery_gap as f64 * MASTERY_GAP_SCALE;

    score += state.weight * WEIGHT_SCALE;

    // Overdue bonus once the exponential review interval has passed
    if state.last_seen_counter > 0 {
        let elapsed = draw_counter.saturating_sub(state.last_seen_counter);
        let required = state.required_interval();
        if elapsed >= required {
            score += ((elapsed - required) as f64).min(MAX_OVERDUE_BONUS);
        }
    }

    score
}

// ==================== Engine ====================

/// Adaptive item picker over a fixed catalog
pub struct SelectionEngine {
    catalog: Catalog,
    state: EngineState,
    rng: ChaCha8Rng,
    candidate_pool: usize,
}

impl SelectionEngine {
    /// Create an engine with default options
    pub fn new(catalog: Catalog) -> Self {
        Self::with_options(catalog, &DrillOptions::default())
    }

    pub fn with_options(catalog: Catalog, options: &DrillOptions) -> Self {
        let seed = options.seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });

        Self {
            state: EngineState::fresh(&catalog),
            catalog,
            rng: ChaCha8Rng::seed_from_u64(seed),
            candidate_pool: options.candidate_pool_size.max(1),
        }
    }

    /// Create an engine with a specific seed (for tests and replays)
    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self::with_options(catalog, &DrillOptions::default().with_seed(seed))
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    // ==================== Drawing ====================

    /// Priority without jitter, `None` for ids outside the catalog
    pub fn base_priority(&self, id: &str) -> Option<f64> {
        self.state
            .items
            .get(id)
            .map(|item| priority_score(item, self.state.seen.contains(id), self.state.draw_counter))
    }

    /// Draw the next item to present.
    ///
    /// Must only be called once the caller's transition guard has released.
    pub fn next_item(&mut self) -> CatalogItem {
        self.state.draw_counter += 1;

        let counter = self.state.draw_counter;
        let mut ranked: Vec<(usize, f64)> = Vec::with_capacity(self.catalog.len());
        for (index, item) in self.catalog.all_items().iter().enumerate() {
            let Some(state) = self.state.items.get(&item.id) else {
                continue;
            };
            let base = priority_score(state, self.state.seen.contains(&item.id), counter);
            let jitter = self.rng.gen_range(0.0..JITTER_RANGE);
            ranked.push((index, base + jitter));
        }

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let pool = self.candidate_pool.min(ranked.len());
        let candidates = &ranked[..pool];

        let mut chosen = self.sample_rank(candidates);

        // Anti-repeat: fall back to the best-ranked other item, once, even
        // when the pool holds a single candidate
        if ranked.len() > 1 {
            let picked_id = &self.catalog.all_items()[ranked[chosen].0].id;
            if self.state.previous_id.as_deref() == Some(picked_id.as_str()) {
                chosen = if chosen == 0 { 1 } else { 0 };
            }
        }

        let (index, score) = ranked[chosen];
        let item = self.catalog.all_items()[index].clone();
        log::debug!("draw #{}: {} (score {:.1})", counter, item.id, score);

        self.state.previous_id = Some(item.id.clone());
        item
    }

    /// Weighted-random rank among candidates, proportional to score
    fn sample_rank(&mut self, candidates: &[(usize, f64)]) -> usize {
        let total: f64 = candidates.iter().map(|(_, score)| score).sum();
        if !(total > 0.0 && total.is_finite()) {
            return 0;
        }

        let mut cursor = self.rng.gen::<f64>() * total;
        for (rank, (_, score)) in candidates.iter().enumerate() {
            cursor -= score;
            if cursor <= 0.0 {
                return rank;
            }
        }

        // Float rounding can leave a sliver of cursor past the last score
        candidates.len() - 1
    }

    // ==================== Outcome Recording ====================

    /// Record a correct answer; returns false for ids outside the catalog
    pub fn record_correct(&mut self, id: &str) -> bool {
        let counter = self.state.draw_counter;
        match self.state.items.get_mut(id) {
            Some(item) => {
                item.apply_correct(counter);
                self.state.seen.insert(id.to_string());
                true
            }
            None => {
                log::debug!("ignoring correct answer for unknown item {}", id);
                false
            }
        }
    }

    /// Record a wrong answer; returns false for ids outside the catalog.
    ///
    /// Does not mark the item as seen.
    pub fn record_wrong(&mut self, id: &str) -> bool {
        let counter = self.state.draw_counter;
        match self.state.items.get_mut(id) {
            Some(item) => {
                item.apply_wrong(counter);
                true
            }
            None => {
                log::debug!("ignoring wrong answer for unknown item {}", id);
                false
            }
        }
    }

    // ==================== Queries ====================

    pub fn item_state(&self, id: &str) -> Option<&ItemState> {
        self.state.items.get(id)
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.state.seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.state.seen.len()
    }

    pub fn total_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn all_seen(&self) -> bool {
        self.seen_count() >= self.total_count()
    }

    pub fn draw_counter(&self) -> u64 {
        self.state.draw_counter
    }

    pub fn previous_id(&self) -> Option<&str> {
        self.state.previous_id.as_deref()
    }

    pub fn learning_stats(&self) -> LearningStats {
        let mut stats = LearningStats::default();

        for item in self.catalog.all_items() {
            let Some(state) = self.state.items.get(&item.id) else {
                continue;
            };

            if !self.state.seen.contains(&item.id) {
                stats.new_items += 1;
            } else if state.mastery >= MASTERED_THRESHOLD {
                stats.mastered += 1;
            } else {
                stats.learning += 1;
            }

            if state.is_difficult() {
                stats.difficult += 1;
            }
        }

        stats
    }

    // ==================== State Management ====================

    /// Forget all progress
    pub fn reset(&mut self) {
        self.state = EngineState::fresh(&self.catalog);
        log::info!("engine reset: {} items back to defaults", self.catalog.len());
    }

    /// Capture the persistable part of the state
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            items: self.state.items.clone(),
            seen: self.state.seen.iter().cloned().collect(),
            draw_counter: Some(self.state.draw_counter),
        }
    }

    /// Merge stored progress over a fresh state.
    ///
    /// Ids no longer in the catalog are dropped, values are clamped into range
    /// and a missing draw counter is recovered from the latest last-seen mark.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) {
        let mut state = EngineState::fresh(&self.catalog);
        let mut stale = 0usize;

        for (id, mut item) in snapshot.items {
            match state.items.get_mut(&id) {
                Some(slot) => {
                    sanitize_item_state(&mut item);
                    *slot = item;
                }
                None => stale += 1,
            }
        }

        for id in snapshot.seen {
            if self.catalog.contains(&id) {
                state.seen.insert(id);
            } else {
                stale += 1;
            }
        }

        let latest_seen = state
            .items
            .values()
            .map(|item| item.last_seen_counter)
            .max()
            .unwrap_or(0);
        state.draw_counter = snapshot.draw_counter.unwrap_or(latest_seen).max(latest_seen);

        if stale > 0 {
            log::debug!("restore skipped {} stale ids", stale);
        }
        log::info!(
            "engine restored: {} seen of {}, draw counter {}",
            state.seen.len(),
            self.catalog.len(),
            state.draw_counter
        );

        self.state = state;
    }
}

// ==================== Unit Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT};
    use std::collections::{BTreeMap, HashSet};

    fn single_q() -> Catalog {
        Catalog::from_table(&[('Q', &["火"])]).unwrap()
    }

    fn small() -> Catalog {
        Catalog::from_table(&[('Q', &["火", "金"]), ('W', &["人"])]).unwrap()
    }

    #[test]
    fn test_priority_of_fresh_item() {
        let state = ItemState::default();
        // 100 unseen + 50 mastery gap + 5 weight
        assert_eq!(priority_score(&state, false, 0), 155.0);
        assert_eq!(priority_score(&state, true, 0), 55.0);
    }

    #[test]
    fn test_priority_overdue_bonus() {
        let state = ItemState {
            weight: 1.0,
            mastery: 2,
            last_seen_counter: 10,
            ..ItemState::default()
        };
        // required interval 4: not yet due at elapsed 3
        assert_eq!(priority_score(&state, true, 13), 35.0);
        // due exactly, bonus 0
        assert_eq!(priority_score(&state, true, 14), 35.0);
        // 6 draws past due
        assert_eq!(priority_score(&state, true, 20), 41.0);
        // bonus capped at 20
        assert_eq!(priority_score(&state, true, 100), 55.0);
    }

    #[test]
    fn test_never_answered_has_no_overdue_bonus() {
        let state = ItemState::default();
        assert_eq!(priority_score(&state, false, 500), 155.0);
    }

    #[test]
    fn test_single_item_always_drawn() {
        let mut engine = SelectionEngine::with_seed(single_q(), 1);
        for _ in 0..20 {
            assert_eq!(engine.next_item().id, "Q_火");
        }
        assert_eq!(engine.draw_counter(), 20);
    }

    #[test]
    fn test_single_item_wrong_then_correct() {
        let mut engine = SelectionEngine::with_seed(single_q(), 1);
        let item = engine.next_item();
        assert!(engine.record_wrong(&item.id));
        assert!(engine.record_correct(&item.id));

        let state = engine.item_state("Q_火").unwrap();
        assert_eq!(state.mastery, 1);
        assert_eq!(state.correct_count, 1);
        assert_eq!(state.wrong_count, 1);
    }

    #[test]
    fn test_no_immediate_repeats() {
        let mut engine = SelectionEngine::with_seed(small(), 7);
        let mut previous = engine.next_item().id;
        for _ in 0..200 {
            let next = engine.next_item().id;
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_no_immediate_repeats_with_single_candidate_pool() {
        let options = DrillOptions {
            candidate_pool_size: 1,
            ..DrillOptions::default().with_seed(3)
        };
        let mut engine = SelectionEngine::with_options(Catalog::builtin(), &options);

        let mut previous = engine.next_item().id;
        for _ in 0..2000 {
            let next = engine.next_item().id;
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_only_top_candidates_are_drawn() {
        // five fresh items outrank six mastered, seen, light ones by > 100
        let catalog = Catalog::from_table(&[
            ('A', &["工", "戈", "七"]),
            ('B', &["子", "了"]),
            ('C', &["又", "巴", "马"]),
            ('D', &["大", "犬", "古"]),
        ])
        .unwrap();
        let mastered = ["C_又", "C_巴", "C_马", "D_大", "D_犬", "D_古"];

        let mut engine = SelectionEngine::with_seed(catalog, 11);
        let mut items = BTreeMap::new();
        for id in mastered {
            items.insert(
                id.to_string(),
                ItemState {
                    weight: MIN_WEIGHT,
                    mastery: MAX_MASTERY,
                    ..ItemState::default()
                },
            );
        }
        engine.restore(ProgressSnapshot {
            items,
            seen: mastered.iter().map(|id| id.to_string()).collect(),
            draw_counter: None,
        });

        let mut drawn = HashSet::new();
        for _ in 0..500 {
            let item = engine.next_item();
            assert!(!mastered.contains(&item.id.as_str()), "drew {}", item.id);
            drawn.insert(item.id);
        }
        assert_eq!(drawn.len(), 5);
    }

    #[test]
    fn test_draws_stay_in_catalog_and_cover_it() {
        let catalog = Catalog::builtin();
        let ids: HashSet<String> = catalog.all_items().iter().map(|i| i.id.clone()).collect();
        let mut engine = SelectionEngine::with_seed(catalog, 2024);
        let mut drawn = HashSet::new();

        for _ in 0..1000 {
            let item = engine.next_item();
            assert!(ids.contains(&item.id));
            drawn.insert(item.id);
        }

        assert_eq!(drawn, ids);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SelectionEngine::with_seed(Catalog::builtin(), 99);
        let mut b = SelectionEngine::with_seed(Catalog::builtin(), 99);
        for _ in 0..50 {
            assert_eq!(a.next_item(), b.next_item());
        }
    }

    #[test]
    fn test_record_correct_updates_state() {
        let mut engine = SelectionEngine::with_seed(Catalog::builtin(), 3);
        engine.next_item();
        engine.next_item();

        assert!(engine.record_correct("Q_火"));
        let state = engine.item_state("Q_火").unwrap();
        assert_eq!(state.mastery, 1);
        assert!(state.weight < DEFAULT_WEIGHT);
        assert_eq!(state.last_seen_counter, 2);
        assert!(engine.is_seen("Q_火"));
        assert_eq!(engine.seen_count(), 1);
    }

    #[test]
    fn test_record_wrong_does_not_mark_seen() {
        let mut engine = SelectionEngine::with_seed(Catalog::builtin(), 3);
        engine.next_item();

        assert!(engine.record_wrong("Q_火"));
        let state = engine.item_state("Q_火").unwrap();
        assert_eq!(state.mastery, 0);
        assert_eq!(state.weight, DEFAULT_WEIGHT + 1.5);
        assert_eq!(state.wrong_count, 1);
        assert!(!engine.is_seen("Q_火"));
    }

    #[test]
    fn test_weight_bounds_hold() {
        let mut engine = SelectionEngine::with_seed(single_q(), 3);
        for _ in 0..10 {
            engine.record_wrong("Q_火");
        }
        assert_eq!(engine.item_state("Q_火").unwrap().weight, MAX_WEIGHT);
        for _ in 0..20 {
            engine.record_correct("Q_火");
        }
        assert_eq!(engine.item_state("Q_火").unwrap().weight, MIN_WEIGHT);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut engine = SelectionEngine::with_seed(single_q(), 3);
        let before = engine.state().clone();
        assert!(!engine.record_correct("X_不存在"));
        assert!(!engine.record_wrong("X_不存在"));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_low_mastery_items_dominate() {
        let mut engine = SelectionEngine::with_seed(small(), 11);
        // Q_火 and Q_金 well learned, W_人 untouched
        for _ in 0..5 {
            engine.record_correct("Q_火");
            engine.record_correct("Q_金");
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for _ in 0..300 {
            *counts.entry(engine.next_item().id).or_default() += 1;
        }
        // anti-repeat caps W_人 at every other draw
        assert!(counts["W_人"] >= 120, "counts: {:?}", counts);
    }

    #[test]
    fn test_learning_stats_partition() {
        let catalog = Catalog::builtin();
        let total = catalog.len();
        let mut engine = SelectionEngine::with_seed(catalog, 5);

        for _ in 0..3 {
            engine.record_correct("A_工");
        }
        engine.record_correct("B_子");
        for _ in 0..3 {
            engine.record_wrong("C_又");
        }
        // mastered and difficult at once
        for _ in 0..3 {
            engine.record_wrong("D_大");
        }
        for _ in 0..4 {
            engine.record_correct("D_大");
        }

        let stats = engine.learning_stats();
        assert_eq!(stats.mastered, 2);
        assert_eq!(stats.learning, 1);
        assert_eq!(stats.new_items, total - 3);
        assert_eq!(stats.difficult, 2);
        assert_eq!(stats.mastered + stats.learning + stats.new_items, total);
    }

    #[test]
    fn test_all_seen() {
        let mut engine = SelectionEngine::with_seed(small(), 5);
        assert!(!engine.all_seen());
        for item in small().all_items() {
            engine.record_correct(&item.id);
        }
        assert!(engine.all_seen());
        assert_eq!(engine.seen_count(), engine.total_count());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut engine = SelectionEngine::with_seed(small(), 5);
        for _ in 0..10 {
            let item = engine.next_item();
            engine.record_correct(&item.id);
        }
        engine.record_wrong("W_人");

        engine.reset();

        assert_eq!(engine.draw_counter(), 0);
        assert_eq!(engine.seen_count(), 0);
        assert_eq!(engine.previous_id(), None);
        for item in small().all_items() {
            assert_eq!(engine.item_state(&item.id), Some(&ItemState::default()));
        }
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut engine = SelectionEngine::with_seed(Catalog::builtin(), 8);
        for step in 0..40 {
            let item = engine.next_item();
            if step % 3 == 0 {
                engine.record_wrong(&item.id);
            } else {
                engine.record_correct(&item.id);
            }
        }
        let snapshot = engine.snapshot();

        let mut restored = SelectionEngine::with_seed(Catalog::builtin(), 8);
        restored.restore(snapshot.clone());

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.learning_stats(), engine.learning_stats());
    }

    #[test]
    fn test_restore_merges_over_defaults() {
        let mut engine = SelectionEngine::with_seed(Catalog::builtin(), 8);
        let mut items = BTreeMap::new();
        items.insert("Q_火".to_string(), ItemState::from_legacy_weight(3.0));
        items.insert(
            "Q_金".to_string(),
            ItemState {
                weight: f64::NAN,
                mastery: 12,
                last_seen_counter: 9,
                wrong_count: 1,
                correct_count: 6,
            },
        );
        items.insert("Q_旧".to_string(), ItemState::default());

        engine.restore(ProgressSnapshot {
            items,
            seen: vec!["Q_金".to_string(), "Q_旧".to_string()],
            draw_counter: None,
        });

        let fire = engine.item_state("Q_火").unwrap();
        assert_eq!(fire.weight, 3.0);
        assert_eq!(fire.mastery, 0);

        let metal = engine.item_state("Q_金").unwrap();
        assert_eq!(metal.weight, DEFAULT_WEIGHT);
        assert_eq!(metal.mastery, MAX_MASTERY);

        assert_eq!(engine.item_state("W_人"), Some(&ItemState::default()));
        assert!(engine.item_state("Q_旧").is_none());
        assert_eq!(engine.seen_count(), 1);
        assert_eq!(engine.draw_counter(), 9);
    }
}
