// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module identifier resolution
//!
//! Identifiers starting with `.` or `..` are resolved against the caller's
//! directory segments. Everything else, including identifiers with a leading
//! `/`, is resolved from the root and ignores the caller.

use crate::error::{LoadError, Result};
use crate::module_system::locator::ModuleLocator;

/// Suffix appended to every canonical location
pub const DEFAULT_SUFFIX: &str = ".js";

/// Pure identifier resolver
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Module-file suffix
    suffix: String,
}

impl ModuleResolver {
    /// Create a resolver using [`DEFAULT_SUFFIX`]
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_SUFFIX)
    }

    /// Create a resolver with a custom module-file suffix
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Module-file suffix in use
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Resolve `identifier` as seen from a module whose directory is `caller`
    pub fn resolve(&self, identifier: &str, caller: &[String]) -> Result<ModuleLocator> {
        if identifier.is_empty() {
            return Err(LoadError::resolution(identifier, "empty identifier"));
        }

        let mut raw: Vec<&str> = identifier.split('/').collect();
        let name = raw.pop().unwrap_or_default();
        match name {
            "" => return Err(LoadError::resolution(identifier, "missing module name")),
            "." | ".." => {
                return Err(LoadError::resolution(
                    identifier,
                    format!("'{}' is not a module name", name),
                ));
            }
            _ => {}
        }

        // Leading slash carries no meaning of its own
        if raw.first() == Some(&"") {
            raw.remove(0);
        }
        if raw.iter().any(|segment| segment.is_empty()) {
            return Err(LoadError::resolution(identifier, "empty path segment"));
        }

        let relative = matches!(raw.first(), Some(&".") | Some(&".."));
        let mut path: Vec<String> = if relative {
            caller.to_vec()
        } else {
            Vec::new()
        };
        path.extend(raw.iter().map(|s| s.to_string()));

        Ok(ModuleLocator::new(name, normalize(path), &self.suffix))
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop `.` segments, then cancel `..` against its predecessor, rightmost first.
/// A `..` at position 0 has nothing to cancel and stays.
fn normalize(mut path: Vec<String>) -> Vec<String> {
    path.retain(|segment| segment != ".");

    while let Some(pos) = path.iter().rposition(|segment| segment == "..") {
        if pos == 0 {
            break;
        }
        path.drain(pos - 1..=pos);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn location(identifier: &str, from: &[&str]) -> String {
        ModuleResolver::new()
            .resolve(identifier, &caller(from))
            .unwrap()
            .location()
            .to_string()
    }

    #[test]
    fn test_relative_from_root() {
        assert_eq!(location("./a/b/c", &[]), "a/b/c.js");
    }

    #[test]
    fn test_relative_from_caller() {
        assert_eq!(location("./a/b/c", &["x"]), "x/a/b/c.js");
    }

    #[test]
    fn test_parent_relative() {
        assert_eq!(location("../a/b/c", &["x", "y", "z"]), "x/y/a/b/c.js");
    }

    #[test]
    fn test_bare_ignores_caller() {
        assert_eq!(location("some/a/b/c", &["x", "y", "z"]), "some/a/b/c.js");
    }

    #[test]
    fn test_internal_parent_segments() {
        assert_eq!(location("../a/b/../c", &["x", "y", "z"]), "x/y/a/c.js");
    }

    #[test]
    fn test_leading_slash_is_absolute() {
        assert_eq!(location("/lib/util", &["x", "y"]), "lib/util.js");
        assert_eq!(location("/util", &["x"]), "util.js");
    }

    #[test]
    fn test_same_module_from_different_callers() {
        let resolver = ModuleResolver::new();
        let a = resolver.resolve("./util", &caller(&["lib"])).unwrap();
        let b = resolver.resolve("../lib/util", &caller(&["app"])).unwrap();
        let c = resolver.resolve("lib/util", &caller(&["deep", "er"])).unwrap();
        assert_eq!(a.location(), b.location());
        assert_eq!(b.location(), c.location());
        assert_eq!(a.segments(), ["lib".to_string()]);
        assert_eq!(a.name(), "util");
    }

    #[test]
    fn test_dot_segments_anywhere() {
        assert_eq!(location("./a/./b/./c", &["x"]), "x/a/b/c.js");
        assert_eq!(location("a/./b", &["x"]), "a/b.js");
    }

    #[test]
    fn test_bare_word_with_parent_inside() {
        assert_eq!(location("a/../b/c", &["x"]), "b/c.js");
    }

    #[test]
    fn test_unresolvable_leading_parent_is_kept() {
        assert_eq!(location("../a", &[]), "../a.js");
        assert_eq!(location("../b/../a", &[]), "../a.js");
    }

    #[test]
    fn test_custom_suffix() {
        let resolver = ModuleResolver::with_suffix(".mjs");
        let locator = resolver.resolve("./m", &caller(&["p"])).unwrap();
        assert_eq!(locator.location(), "p/m.mjs");
    }

    #[test]
    fn test_malformed_identifiers() {
        let resolver = ModuleResolver::new();
        for bad in ["", "a/", "./", ".", "..", "./..", "a//b"] {
            let err = resolver.resolve(bad, &[]).unwrap_err();
            assert!(
                matches!(err, LoadError::Resolution { .. }),
                "expected resolution error for {:?}",
                bad
            );
        }
    }
}
