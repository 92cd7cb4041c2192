// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use crate::error::{LoadError, Result};
use crate::module_system::record::ModuleRecord;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Thread-safe module cache, one record per canonical location
///
/// Records are never removed or replaced.
#[derive(Default)]
pub struct ModuleCache {
    /// Cache mapping canonical locations to module records
    records: DashMap<String, Arc<ModuleRecord>>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Get a record by canonical location
    pub fn get(&self, location: &str) -> Option<Arc<ModuleRecord>> {
        self.records.get(location).map(|entry| Arc::clone(entry.value()))
    }

    /// Add a record under its own location; fails if the location is taken
    pub fn insert(&self, record: Arc<ModuleRecord>) -> Result<()> {
        match self.records.entry(record.location().to_string()) {
            Entry::Occupied(entry) => Err(LoadError::DuplicateRecord(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    /// Check if a location is cached
    pub fn contains(&self, location: &str) -> bool {
        self.records.contains_key(location)
    }

    /// All cached locations, sorted
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.records.iter().map(|entry| entry.key().clone()).collect();
        locations.sort();
        locations
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::locator::ModuleLocator;

    fn record(name: &str) -> Arc<ModuleRecord> {
        Arc::new(ModuleRecord::new(ModuleLocator::new(name, Vec::new(), ".js"), None))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ModuleCache::new();
        assert!(cache.is_empty());

        let rec = record("main");
        cache.insert(Arc::clone(&rec)).unwrap();

        let found = cache.get("main.js").unwrap();
        assert!(Arc::ptr_eq(&rec, &found));
        assert!(cache.contains("main.js"));
        assert!(cache.get("other.js").is_none());
    }

    #[test]
    fn test_one_record_per_location() {
        let cache = ModuleCache::new();
        let first = record("main");
        cache.insert(Arc::clone(&first)).unwrap();

        let err = cache.insert(record("main")).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateRecord(ref loc) if loc == "main.js"));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &cache.get("main.js").unwrap()));
    }

    #[test]
    fn test_locations_sorted() {
        let cache = ModuleCache::new();
        for name in ["zeta", "alpha", "mid"] {
            cache.insert(record(name)).unwrap();
        }
        assert_eq!(cache.locations(), vec!["alpha.js", "mid.js", "zeta.js"]);
    }
}
