// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Precompiled module registry
//!
//! Module bodies are Rust closures registered by canonical location. The
//! registry serves as both fetcher and evaluator, so it can be handed to
//! [`ModuleLoader::new`](crate::ModuleLoader::new) twice through an `Arc`.

use crate::error::{EvalError, FetchError};
use crate::eval::{Bindings, Evaluator};
use crate::fetch::Fetcher;
use dashmap::DashMap;
use std::sync::Arc;

/// A native module body
pub type NativeBody = dyn Fn(&Bindings<'_>) -> Result<(), EvalError> + Send + Sync;

/// Registry of native module bodies keyed by canonical location
#[derive(Default)]
pub struct NativeRegistry {
    bodies: DashMap<String, Arc<NativeBody>>,
    runs: DashMap<String, usize>,
}

impl NativeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body for `location` (e.g. `"lib/util.js"`)
    pub fn register<F>(&self, location: impl Into<String>, body: F)
    where
        F: Fn(&Bindings<'_>) -> Result<(), EvalError> + Send + Sync + 'static,
    {
        self.bodies.insert(location.into(), Arc::new(body));
    }

    /// Check if a location has a body
    pub fn contains(&self, location: &str) -> bool {
        self.bodies.contains_key(location)
    }

    /// How many times the body for `location` has been run
    pub fn run_count(&self, location: &str) -> usize {
        self.runs.get(location).map(|n| *n).unwrap_or(0)
    }
}

impl Fetcher for NativeRegistry {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if self.contains(location) {
            Ok(format!("native:{}", location))
        } else {
            Err(FetchError::NotFound(location.to_string()))
        }
    }
}

impl Evaluator for NativeRegistry {
    fn evaluate(&self, _source: &str, bindings: Bindings<'_>) -> Result<(), EvalError> {
        let location = bindings.module.location();
        // Clone the body out so no map guard is held while it re-enters the loader
        let body = self
            .bodies
            .get(location)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EvalError::Unregistered(location.to_string()))?;

        *self.runs.entry(location.to_string()).or_insert(0) += 1;
        (*body)(&bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_reports_unregistered() {
        let registry = NativeRegistry::new();
        registry.register("a.js", |_: &Bindings<'_>| Ok(()));
        assert!(registry.fetch("a.js").is_ok());
        assert!(matches!(registry.fetch("b.js"), Err(FetchError::NotFound(_))));
        assert_eq!(registry.run_count("a.js"), 0);
    }
}
