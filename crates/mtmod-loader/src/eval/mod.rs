// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module body execution
//!
//! An [`Evaluator`] runs a module body to completion with three names bound:
//! `require`, `module` and `exports`. Nested `require` calls re-enter the
//! loader before the body continues.

mod native;
mod script;

pub use native::{NativeBody, NativeRegistry};
pub use script::ScriptEvaluator;

use crate::error::EvalError;
use crate::module_system::{ModuleRecord, Require};
use crate::value::Object;

/// The scope a module body runs in
pub struct Bindings<'a> {
    /// require(), bound to the running module
    pub require: Require<'a>,
    /// The running module's record
    pub module: &'a ModuleRecord,
    /// Same object as `module.exports()`
    pub exports: Object,
}

/// Executes module source synchronously
pub trait Evaluator: Send + Sync {
    /// Run `source` to completion
    fn evaluate(&self, source: &str, bindings: Bindings<'_>) -> Result<(), EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for std::sync::Arc<E> {
    fn evaluate(&self, source: &str, bindings: Bindings<'_>) -> Result<(), EvalError> {
        (**self).evaluate(source, bindings)
    }
}
