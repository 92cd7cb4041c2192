// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File system fetcher

use crate::error::FetchError;
use crate::fetch::Fetcher;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Reads modules from a directory tree
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Create a fetcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location onto a path below the root
    fn path_for(&self, location: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(location);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::OutsideRoot(location.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for FsFetcher {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let path = self.path_for(location)?;
        trace!(path = %path.display(), "reading module source");
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_below_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/util.js"), "exports.ok = true").unwrap();

        let fetcher = FsFetcher::new(dir.path());
        assert_eq!(fetcher.fetch("lib/util.js").unwrap(), "exports.ok = true");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        assert!(matches!(fetcher.fetch("nope.js"), Err(FetchError::NotFound(_))));
    }

    #[test]
    fn test_refuses_escaping_locations() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        assert!(matches!(fetcher.fetch("../secret.js"), Err(FetchError::OutsideRoot(_))));
        assert!(matches!(fetcher.fetch("/etc/passwd"), Err(FetchError::OutsideRoot(_))));
    }
}
