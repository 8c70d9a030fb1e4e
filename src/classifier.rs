// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Unlock state classification.
//!
//! Maps the upstream per-item unlock map against the catalog to one of
//! three coarse statuses. Purely derived; nothing is stored.

use crate::catalog::ItemCatalog;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Per-item unlock flags as exchanged with the upstream profile service.
pub type UnlockMap = HashMap<String, bool>;

/// Coarse unlock status derived from the upstream unlock map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStatus {
    /// No unlock map, or nothing unlocked
    Locked,
    /// Any state other than "none" or "exactly the full catalog"
    Corrupted,
    /// Exactly the catalog's item set is unlocked
    Unlocked,
}

impl UnlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Corrupted => "corrupted",
            Self::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for UnlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an unlock map against the catalog.
///
/// Only items whose flag is true count as unlocked. Full unlock requires
/// set equality with the catalog: membership alone is not enough when the
/// map carries extra unknown items, so cardinality is compared too.
pub fn classify(unlocks: Option<&UnlockMap>, catalog: &ItemCatalog) -> UnlockStatus {
    let Some(map) = unlocks else {
        return UnlockStatus::Locked;
    };

    let unlocked: HashSet<&str> = map
        .iter()
        .filter(|(_, &flag)| flag)
        .map(|(item, _)| item.as_str())
        .collect();

    if unlocked.is_empty() {
        return UnlockStatus::Locked;
    }

    if unlocked.len() == catalog.len() && unlocked.iter().all(|item| catalog.contains(item)) {
        UnlockStatus::Unlocked
    } else {
        UnlockStatus::Corrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(["a".to_string(), "b".to_string()])
    }

    fn map_of(entries: &[(&str, bool)]) -> UnlockMap {
        entries
            .iter()
            .map(|(item, flag)| (item.to_string(), *flag))
            .collect()
    }

    #[test]
    fn test_absent_map_is_locked() {
        assert_eq!(classify(None, &catalog()), UnlockStatus::Locked);
    }

    #[test]
    fn test_empty_map_is_locked() {
        assert_eq!(classify(Some(&map_of(&[])), &catalog()), UnlockStatus::Locked);
    }

    #[test]
    fn test_all_flags_false_is_locked() {
        let map = map_of(&[("a", false), ("b", false)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Locked);
    }

    #[test]
    fn test_partial_unlock_is_corrupted() {
        let map = map_of(&[("a", true)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Corrupted);
    }

    #[test]
    fn test_full_unlock() {
        let map = map_of(&[("a", true), ("b", true)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Unlocked);
    }

    #[test]
    fn test_extra_unlocked_item_is_corrupted() {
        let map = map_of(&[("a", true), ("b", true), ("c", true)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Corrupted);
    }

    #[test]
    fn test_unknown_item_replacing_catalog_item_is_corrupted() {
        let map = map_of(&[("a", true), ("c", true)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Corrupted);
    }

    #[test]
    fn test_false_flags_do_not_count_against_full_unlock() {
        let map = map_of(&[("a", true), ("b", true), ("c", false)]);
        assert_eq!(classify(Some(&map), &catalog()), UnlockStatus::Unlocked);
    }

    #[test]
    fn test_status_rendering() {
        assert_eq!(UnlockStatus::Locked.to_string(), "locked");
        assert_eq!(UnlockStatus::Corrupted.to_string(), "corrupted");
        assert_eq!(UnlockStatus::Unlocked.to_string(), "unlocked");
    }
}
