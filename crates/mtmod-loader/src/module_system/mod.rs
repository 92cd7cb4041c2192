// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS-style module system
//!
//! - Identifier resolution against the caller's directory
//! - One record per canonical location, cached before its body runs
//! - Cyclic `require` returns the in-progress exports object
//! - `Loading -> Loaded | Failed`, both terminal

mod cache;
mod loader;
mod locator;
mod record;
mod require;
mod resolver;

pub use cache::ModuleCache;
pub use loader::ModuleLoader;
pub use locator::ModuleLocator;
pub use record::{ModuleRecord, ModuleState};
pub use require::Require;
pub use resolver::{DEFAULT_SUFFIX, ModuleResolver};
