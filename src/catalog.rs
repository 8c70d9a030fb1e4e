// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Item catalog loading.
//!
//! The catalog is the canonical ordered list of item identifiers required
//! for full unlock. It is loaded once at startup, either from a flat JSON
//! array or derived from a nested assignment document
//! (`{group: {slot: [item, ...]}}`), and is immutable afterwards.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Nested assignment document shape: group -> slot -> item identifiers.
pub type ItemAssignment = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Catalog loading error types.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog file {0} contains no items")]
    Empty(String),
}

/// The canonical item list: ordered, de-duplicated, with set membership.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    items: Vec<String>,
    index: HashSet<String>,
}

impl ItemCatalog {
    /// Build a catalog from an item list, de-duplicating while keeping
    /// first-occurrence order.
    pub fn new(items: impl IntoIterator<Item = String>) -> Self {
        let mut ordered = Vec::new();
        let mut index = HashSet::new();
        for item in items {
            if index.insert(item.clone()) {
                ordered.push(item);
            }
        }
        Self {
            items: ordered,
            index,
        }
    }

    /// Load a catalog from a flat JSON array of item identifiers.
    pub fn from_items_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let items: Vec<String> = read_json(path.as_ref())?;
        let catalog = Self::new(items);
        if catalog.is_empty() {
            return Err(CatalogError::Empty(path.as_ref().display().to_string()));
        }
        Ok(catalog)
    }

    /// Load a catalog by flattening a nested assignment document.
    pub fn from_assignment_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let assignment: ItemAssignment = read_json(path.as_ref())?;
        let catalog = Self::from_assignment(&assignment);
        if catalog.is_empty() {
            return Err(CatalogError::Empty(path.as_ref().display().to_string()));
        }
        Ok(catalog)
    }

    /// Flatten an assignment document into a catalog.
    pub fn from_assignment(assignment: &ItemAssignment) -> Self {
        Self::new(
            assignment
                .values()
                .flat_map(|slots| slots.values())
                .flatten()
                .cloned(),
        )
    }

    /// The item identifiers in catalog order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of distinct items required for full unlock.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item identifier belongs to the catalog.
    pub fn contains(&self, item: &str) -> bool {
        self.index.contains(item)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}
