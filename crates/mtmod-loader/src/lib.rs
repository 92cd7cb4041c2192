// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # mtmod-loader
//!
//! A dependency-ordered, CommonJS-style module loader.
//!
//! Given an entry identifier, the loader resolves identifiers to canonical
//! locations, fetches their source, runs each body once with `require`,
//! `module` and `exports` bound, and caches the result. Cyclic requires
//! receive the in-progress exports object instead of re-running a module.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mtmod_loader::{FsFetcher, ModuleLoader, ScriptEvaluator};
//!
//! let loader = ModuleLoader::new(FsFetcher::new("public/js"), ScriptEvaluator::new());
//! let exports = loader.load_entry("/app/main")?;
//! println!("{}", mtmod_loader::Value::Object(exports));
//! # Ok::<(), mtmod_loader::LoadError>(())
//! ```
//!
//! ## Native modules
//!
//! Where module text cannot be evaluated at runtime, bodies can be
//! registered ahead of time:
//!
//! ```rust
//! use mtmod_loader::{Bindings, ModuleLoader, NativeRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(NativeRegistry::new());
//! registry.register("lib/answer.js", |m: &Bindings<'_>| {
//!     m.exports.set("value", 42.0);
//!     Ok(())
//! });
//!
//! let loader = ModuleLoader::new(Arc::clone(&registry), Arc::clone(&registry));
//! let answer = loader.load_entry("lib/answer").unwrap();
//! assert_eq!(answer.get("value"), Some(42.0.into()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod eval;
pub mod fetch;
pub mod module_system;
pub mod value;

// Re-exports
pub use error::{ErrorKind, EvalError, FetchError, LoadError, Result};
pub use eval::{Bindings, Evaluator, NativeRegistry, ScriptEvaluator};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{Fetcher, FsFetcher, MemoryFetcher};
pub use module_system::{
    DEFAULT_SUFFIX, ModuleCache, ModuleLoader, ModuleLocator, ModuleRecord, ModuleResolver, ModuleState, Require,
};
pub use value::{Object, Value};

/// Version of the loader crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
