// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolved module locators

use std::fmt;

/// Immutable result of resolving an identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocator {
    name: String,
    segments: Vec<String>,
    location: String,
}

impl ModuleLocator {
    /// Build a locator, deriving the canonical location from segments, name and suffix
    pub fn new(name: impl Into<String>, segments: Vec<String>, suffix: &str) -> Self {
        let name = name.into();
        let location = if segments.is_empty() {
            format!("{}{}", name, suffix)
        } else {
            format!("{}/{}{}", segments.join("/"), name, suffix)
        };
        Self {
            name,
            segments,
            location,
        }
    }

    /// The empty caller context the entry module is loaded from
    pub fn root() -> Self {
        Self {
            name: String::new(),
            segments: Vec::new(),
            location: String::new(),
        }
    }

    /// Module name (last identifier segment)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized directory segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical location string used as the cache key
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Check if this is the root caller context
    pub fn is_root(&self) -> bool {
        self.location.is_empty()
    }
}

impl fmt::Display for ModuleLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.location)
        }
    }
}
