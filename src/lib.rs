//! # zigen-drill - adaptive component-to-key drill
//!
//! Pure Rust core of a flashcard drill for learning which keyboard key types
//! each character component (字根) of a shape-based input method:
//!
//! - **Catalog** - the fixed component/key table
//! - **Selection engine** - priority scoring with mastery streaks, weights and
//!   exponential review intervals, plus weighted sampling without immediate
//!   repeats
//! - **Storage** - the persisted progress document, legacy upgrade, backup
//!   export/import and key-value backends
//! - **Session** - draw/answer/autosave orchestration with a transition guard
//!
//! ## Modules
//!
//! - [`catalog`] - component table and lookups
//! - [`engine`] - selection & scoring engine
//! - [`storage`] - progress document and stores
//! - [`session`] - drill session orchestration
//! - [`stats`] - session counters (attempts, combos)
//! - [`sanitize`] - clamping of restored values
//! - [`config`] - drill options
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use zigen_drill::{Catalog, SelectionEngine};
//!
//! let mut engine = SelectionEngine::with_seed(Catalog::builtin(), 42);
//! let item = engine.next_item();
//! engine.record_correct(&item.id);
//! assert_eq!(engine.seen_count(), 1);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod sanitize;
pub mod session;
pub mod stats;
pub mod storage;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use catalog::{Catalog, CatalogError};
pub use config::DrillOptions;
pub use engine::{priority_score, EngineState, ProgressSnapshot, SelectionEngine};
pub use session::{AnswerOutcome, DrillSession, TransitionGuard};
pub use stats::SessionStats;
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, ProgressDocument, ProgressStore, StorageError,
    StorageResult,
};
pub use types::*;
