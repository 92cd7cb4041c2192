// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS require() binding

use crate::error::Result;
use crate::module_system::loader::ModuleLoader;
use crate::module_system::locator::ModuleLocator;
use crate::value::Object;

/// `require` as seen by one module: the loader pre-bound to that module's locator
#[derive(Clone, Copy)]
pub struct Require<'a> {
    loader: &'a ModuleLoader,
    caller: &'a ModuleLocator,
}

impl<'a> Require<'a> {
    /// Bind `loader` to `caller`
    pub fn new(loader: &'a ModuleLoader, caller: &'a ModuleLocator) -> Self {
        Self { loader, caller }
    }

    /// require(identifier)
    pub fn call(&self, identifier: &str) -> Result<Object> {
        self.loader.load(identifier, self.caller)
    }

    /// require.resolve() - canonical location without loading
    pub fn resolve(&self, identifier: &str) -> Result<String> {
        self.loader
            .resolve(identifier, self.caller)
            .map(|locator| locator.location().to_string())
    }

    /// Locator of the requiring module
    pub fn caller(&self) -> &ModuleLocator {
        self.caller
    }

    /// Underlying loader
    pub fn loader(&self) -> &'a ModuleLoader {
        self.loader
    }
}
