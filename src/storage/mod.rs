//! Progress persistence
//!
//! Provides:
//! - The progress document and its lenient loader (including the legacy
//!   flat-weight format)
//! - A key-value store seam with in-memory and file-backed backends
//! - `ProgressStore`, which loads and saves the document under one key
//!
//! Storage failures never take the drill down: loads fall back to defaults
//! and saves report an error the caller may log and drop.

// ============================================================
// Submodules
// ============================================================

pub mod document;
pub mod store;

pub use document::ProgressDocument;
pub use store::{FileStore, KeyValueStore, MemoryStore};

use thiserror::Error;

// ============================================================
// Errors
// ============================================================

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// ProgressStore
// ============================================================

/// Loads and saves the progress document under a single key
pub struct ProgressStore<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Load the stored document merged over defaults.
    ///
    /// Never fails: read errors and unreadable blobs are logged and yield the
    /// default document.
    pub fn load(&self) -> ProgressDocument {
        match self.backend.get(&self.key) {
            Ok(Some(text)) => ProgressDocument::from_stored(&text),
            Ok(None) => ProgressDocument::default(),
            Err(e) => {
                log::warn!("failed to read progress under {}: {}", self.key, e);
                ProgressDocument::default()
            }
        }
    }

    pub fn save(&mut self, document: &ProgressDocument) -> StorageResult<()> {
        let text = serde_json::to_string(document)?;
        self.backend.set(&self.key, &text)
    }

    /// Remove the stored document; returns whether one existed
    pub fn clear(&mut self) -> StorageResult<bool> {
        self.backend.remove(&self.key)
    }
}
