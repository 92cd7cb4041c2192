// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-memory fetcher for bundled sources

use crate::error::FetchError;
use crate::fetch::Fetcher;
use dashmap::DashMap;

/// Source table keyed by canonical location, with per-location fetch counts
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    sources: DashMap<String, String>,
    fetches: DashMap<String, usize>,
}

impl MemoryFetcher {
    /// Create an empty source table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the source at `location`
    pub fn insert(&self, location: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(location.into(), source.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(self, location: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(location, source);
        self
    }

    /// How many times `location` was fetched, hits and misses alike
    pub fn fetch_count(&self, location: &str) -> usize {
        self.fetches.get(location).map(|n| *n).unwrap_or(0)
    }

    /// Total number of fetches
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        *self.fetches.entry(location.to_string()).or_insert(0) += 1;
        self.sources
            .get(location)
            .map(|source| source.clone())
            .ok_or_else(|| FetchError::NotFound(location.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_hits_and_misses() {
        let fetcher = MemoryFetcher::new().with("a.js", "exports.a = 1");
        assert_eq!(fetcher.fetch("a.js").unwrap(), "exports.a = 1");
        assert!(fetcher.fetch("b.js").is_err());
        assert_eq!(fetcher.fetch_count("a.js"), 1);
        assert_eq!(fetcher.fetch_count("b.js"), 1);
        assert_eq!(fetcher.total_fetches(), 2);
    }
}
