//! WebAssembly exports for the drill page
//!
//! The page owns local storage: it passes the stored blob in when the drill
//! starts and reads `storedJson()` back after answers and on page hide.

use wasm_bindgen::prelude::*;

use crate::catalog::Catalog;
use crate::config::DrillOptions;
use crate::session::DrillSession;
use crate::storage::{KeyValueStore, MemoryStore};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct ZigenDrill {
    session: DrillSession<MemoryStore>,
}

#[wasm_bindgen]
impl ZigenDrill {
    /// `seed` comes from the page (e.g. `Math.random() * 2 ** 32`), `saved`
    /// is the blob previously read from local storage.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64, saved: Option<String>) -> Result<ZigenDrill, JsValue> {
        let options = DrillOptions::default().with_seed(seed.max(0.0) as u64);

        let mut backend = MemoryStore::new();
        if let Some(text) = saved {
            backend
                .set(&options.storage_key, &text)
                .map_err(js_error)?;
        }

        Ok(ZigenDrill {
            session: DrillSession::open(Catalog::builtin(), &options, backend),
        })
    }

    /// Draw the next item: `{ id, char, key }`
    #[wasm_bindgen(js_name = nextItem)]
    pub fn next_item(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        let item = self.session.advance(now_ms as i64);
        to_js(&item)
    }

    /// Submit a key press; returns the tagged outcome
    pub fn submit(&mut self, key: &str, now_ms: f64) -> Result<JsValue, JsValue> {
        let Some(pressed) = key.chars().next() else {
            return Err(js_error("empty key"));
        };
        let outcome = self.session.submit(pressed, now_ms as i64);
        to_js(&outcome)
    }

    /// Latest saved document, for writing to local storage
    #[wasm_bindgen(js_name = storedJson)]
    pub fn stored_json(&self) -> Result<Option<String>, JsValue> {
        let store = self.session.store();
        store.backend().get(store.key()).map_err(js_error)
    }

    pub fn flush(&mut self) -> bool {
        self.session.flush()
    }

    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.session.export_json().map_err(js_error)
    }

    /// Apply a backup; resolves to whether it was also saved
    #[wasm_bindgen(js_name = importJson)]
    pub fn import_json(&mut self, text: &str) -> Result<bool, JsValue> {
        self.session.import_json(text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&mut self) -> bool {
        self.session.reset_progress()
    }

    #[wasm_bindgen(js_name = sessionStats)]
    pub fn session_stats(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.stats())
    }

    #[wasm_bindgen(js_name = learningStats)]
    pub fn learning_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.learning_stats())
    }

    /// Session accuracy in percent
    pub fn accuracy(&self) -> f64 {
        self.session.stats().accuracy()
    }

    #[wasm_bindgen(js_name = seenCount)]
    pub fn seen_count(&self) -> usize {
        self.session.engine().seen_count()
    }

    #[wasm_bindgen(js_name = totalCount)]
    pub fn total_count(&self) -> usize {
        self.session.engine().total_count()
    }

    #[wasm_bindgen(js_name = allSeen)]
    pub fn all_seen(&self) -> bool {
        self.session.engine().all_seen()
    }

    /// Glyphs typed with `key`, for the key-hint panel
    #[wasm_bindgen(js_name = itemsForKey)]
    pub fn items_for_key(&self, key: &str) -> Vec<String> {
        key.chars()
            .next()
            .map(|k| {
                self.session
                    .engine()
                    .catalog()
                    .items_for_key(k)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
