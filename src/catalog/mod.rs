//! Component catalog
//!
//! The fixed set of drillable items, derived once from a key → components
//! lookup table. Iteration order is table declaration order.

use std::collections::HashSet;

use thiserror::Error;

use crate::types::CatalogItem;

// ==================== Built-in Table ====================

/// Built-in key → component table, one row per key A–Z
pub const BUILTIN_TABLE: &[(char, &[&str])] = &[
    ('A', &["工", "戈", "廾"]),
    ('B', &["子", "耳"]),
    ('C', &["又", "厶", "巴"]),
    ('D', &["大", "石"]),
    ('E', &["月", "用", "彡"]),
    ('F', &["土", "士", "二"]),
    ('G', &["王", "一"]),
    ('H', &["目", "止", "卜"]),
    ('I', &["水", "氵"]),
    ('J', &["日", "虫"]),
    ('K', &["口", "川"]),
    ('L', &["田", "车", "甲"]),
    ('M', &["山", "贝"]),
    ('N', &["已", "尸", "心"]),
    ('O', &["米", "灬"]),
    ('P', &["之", "宀", "冖"]),
    ('Q', &["火", "金", "犭"]),
    ('R', &["白", "扌"]),
    ('S', &["木", "丁", "西"]),
    ('T', &["禾", "竹"]),
    ('U', &["立", "门", "辛"]),
    ('V', &["女", "刀"]),
    ('W', &["人", "亻", "八"]),
    ('X', &["纟", "弓"]),
    ('Y', &["言", "讠", "文"]),
    ('Z', &["乙", "乚"]),
];

// ==================== Errors ====================

/// Catalog construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no items")]
    Empty,

    #[error("key {0:?} is not an ASCII letter")]
    InvalidKey(char),

    #[error("empty glyph under key {0}")]
    EmptyGlyph(char),

    #[error("duplicate item id: {0}")]
    DuplicateId(String),
}

// ==================== Catalog ====================

/// Immutable, non-empty list of catalog items
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// The built-in 26-key catalog
    pub fn builtin() -> Self {
        let items = BUILTIN_TABLE
            .iter()
            .flat_map(|(key, glyphs)| glyphs.iter().map(move |glyph| CatalogItem::new(*key, glyph)))
            .collect();
        Self { items }
    }

    /// Build a catalog from a custom table, rejecting anything that would
    /// leave the engine without a valid item to draw.
    pub fn from_table(table: &[(char, &[&str])]) -> Result<Self, CatalogError> {
        let mut items = Vec::new();
        let mut ids = HashSet::new();

        for (key, glyphs) in table {
            if !key.is_ascii_alphabetic() {
                return Err(CatalogError::InvalidKey(*key));
            }
            for glyph in glyphs.iter() {
                if glyph.trim().is_empty() {
                    return Err(CatalogError::EmptyGlyph(key.to_ascii_uppercase()));
                }
                let item = CatalogItem::new(*key, glyph);
                if !ids.insert(item.id.clone()) {
                    return Err(CatalogError::DuplicateId(item.id));
                }
                items.push(item);
            }
        }

        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { items })
    }

    /// All items in declaration order
    pub fn all_items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Glyphs mapped to `key`, case-insensitive; empty for unknown keys
    pub fn items_for_key(&self, key: char) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.is_answered_by(key))
            .map(|item| item.glyph.as_str())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Distinct keys in declaration order
    pub fn keys(&self) -> Vec<char> {
        let mut keys: Vec<char> = Vec::new();
        for item in &self.items {
            if !keys.contains(&item.key) {
                keys.push(item.key);
            }
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==================== Unit Tests ====================
