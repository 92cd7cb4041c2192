// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - fetches, evaluates and caches modules

use crate::error::{LoadError, Result};
use crate::eval::{Bindings, Evaluator};
use crate::fetch::Fetcher;
use crate::module_system::cache::ModuleCache;
use crate::module_system::locator::ModuleLocator;
use crate::module_system::record::ModuleRecord;
use crate::module_system::require::Require;
use crate::module_system::resolver::ModuleResolver;
use crate::value::Object;
use parking_lot::ReentrantMutex;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Module loader
///
/// Every `load` runs under a reentrant lock: a module body may `require`
/// from the same thread, while loads from other threads wait their turn.
pub struct ModuleLoader {
    /// Module resolver
    resolver: ModuleResolver,
    /// Module cache
    cache: ModuleCache,
    fetcher: Arc<dyn Fetcher>,
    evaluator: Arc<dyn Evaluator>,
    gate: ReentrantMutex<()>,
}

impl ModuleLoader {
    /// Create a loader with the default resolver
    pub fn new(fetcher: impl Fetcher + 'static, evaluator: impl Evaluator + 'static) -> Self {
        Self::with_resolver(ModuleResolver::new(), fetcher, evaluator)
    }

    /// Create a loader with a custom resolver
    pub fn with_resolver(
        resolver: ModuleResolver,
        fetcher: impl Fetcher + 'static,
        evaluator: impl Evaluator + 'static,
    ) -> Self {
        Self {
            resolver,
            cache: ModuleCache::new(),
            fetcher: Arc::new(fetcher),
            evaluator: Arc::new(evaluator),
            gate: ReentrantMutex::new(()),
        }
    }

    /// Load the entry module from the root context
    pub fn load_entry(&self, identifier: &str) -> Result<Object> {
        self.load(identifier, &ModuleLocator::root())
    }

    /// Load `identifier` as required by `caller`, returning its exports
    ///
    /// A location already in the cache answers immediately with the same
    /// exports object, even while its body is still running.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub fn load(&self, identifier: &str, caller: &ModuleLocator) -> Result<Object> {
        let _gate = self.gate.lock();

        let locator = self.resolver.resolve(identifier, caller.segments())?;

        if let Some(record) = self.cache.get(locator.location()) {
            debug!(location = %locator.location(), state = %record.state(), "serving cached module");
            return record.cached_exports();
        }

        debug!(location = %locator.location(), "loading new module");
        let parent = (!caller.is_root()).then(|| caller.location().to_string());
        let record = Arc::new(ModuleRecord::new(locator, parent));
        // Must be visible before the body runs, or a cycle would recurse forever
        self.cache.insert(Arc::clone(&record))?;

        self.run(&record).inspect_err(|err| {
            warn!(location = %record.location(), error = %err, "module failed to load");
            record.mark_failed(err);
        })?;

        record.mark_loaded();
        Ok(record.exports())
    }

    fn run(&self, record: &ModuleRecord) -> Result<()> {
        let location = record.location();

        let source = self.fetcher.fetch(location).map_err(|source| LoadError::Fetch {
            location: location.to_string(),
            source,
        })?;

        let bindings = Bindings {
            require: Require::new(self, record.locator()),
            module: record,
            exports: record.exports(),
        };
        self.evaluator
            .evaluate(&source, bindings)
            .map_err(|source| LoadError::Evaluation {
                location: location.to_string(),
                source,
            })
    }

    /// Resolve without loading (`require.resolve`)
    pub fn resolve(&self, identifier: &str, caller: &ModuleLocator) -> Result<ModuleLocator> {
        self.resolver.resolve(identifier, caller.segments())
    }

    /// Get the module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Get the resolver
    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }
}
