// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records and their load state

use crate::error::{ErrorKind, EvalError, LoadError};
use crate::module_system::locator::ModuleLocator;
use crate::value::{Object, Value};
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, warn};

/// Load state of a module record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Inserted into the cache, body not finished yet
    Loading,
    /// Body ran to completion
    Loaded,
    /// Fetch or evaluation failed; terminal
    Failed,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::Loading => write!(f, "loading"),
            ModuleState::Loaded => write!(f, "loaded"),
            ModuleState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct Status {
    state: ModuleState,
    failure: Option<(ErrorKind, String)>,
}

/// Cache entry for one canonical location
///
/// This is the `module` binding handed to module code. The exports object is
/// created with the record and never swapped out.
#[derive(Debug)]
pub struct ModuleRecord {
    locator: ModuleLocator,
    exports: Object,
    /// Location of the module that first required this one
    parent: Option<String>,
    status: RwLock<Status>,
}

impl ModuleRecord {
    /// Create a record in `Loading` state with empty exports
    pub fn new(locator: ModuleLocator, parent: Option<String>) -> Self {
        Self {
            locator,
            exports: Object::new(),
            parent,
            status: RwLock::new(Status {
                state: ModuleState::Loading,
                failure: None,
            }),
        }
    }

    /// Resolved locator
    pub fn locator(&self) -> &ModuleLocator {
        &self.locator
    }

    /// Canonical location (also exposed to module code as `module.id`)
    pub fn location(&self) -> &str {
        self.locator.location()
    }

    /// Location of the first requiring module, `None` for the entry
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Another reference to the exports object
    pub fn exports(&self) -> Object {
        self.exports.clone()
    }

    /// `module.exports = value`
    ///
    /// The exports identity is fixed, so an object's properties are copied
    /// into the existing exports object.
    pub fn set_exports(&self, value: &Value) -> Result<(), EvalError> {
        match value {
            Value::Object(obj) => {
                self.exports.replace_contents(obj);
                Ok(())
            }
            other => Err(EvalError::type_error(format!(
                "module.exports must be an object, got {}",
                other.type_of()
            ))),
        }
    }

    /// Current load state
    pub fn state(&self) -> ModuleState {
        self.status.read().state
    }

    /// Exports for a `require` that hit the cache. Loading or loaded modules
    /// hand out their exports; failed ones replay the failure.
    pub fn cached_exports(&self) -> Result<Object, LoadError> {
        let status = self.status.read();
        match (&status.state, &status.failure) {
            (ModuleState::Failed, Some((kind, reason))) => Err(LoadError::PreviouslyFailed {
                location: self.location().to_string(),
                kind: *kind,
                reason: reason.clone(),
            }),
            (ModuleState::Failed, None) => Err(LoadError::PreviouslyFailed {
                location: self.location().to_string(),
                kind: ErrorKind::Internal,
                reason: "unknown failure".to_string(),
            }),
            _ => Ok(self.exports.clone()),
        }
    }

    /// `Loading -> Loaded`
    pub(crate) fn mark_loaded(&self) {
        let mut status = self.status.write();
        if status.state != ModuleState::Loading {
            warn!(location = %self.location(), state = %status.state, "ignoring transition to loaded");
            return;
        }
        status.state = ModuleState::Loaded;
        debug!(location = %self.location(), "module loaded");
    }

    /// `Loading -> Failed`
    pub(crate) fn mark_failed(&self, err: &LoadError) {
        let mut status = self.status.write();
        if status.state != ModuleState::Loading {
            warn!(location = %self.location(), state = %status.state, "ignoring transition to failed");
            return;
        }
        status.state = ModuleState::Failed;
        status.failure = Some((err.kind(), err.to_string()));
        debug!(location = %self.location(), "module failed");
    }
}
