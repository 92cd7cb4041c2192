// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration management for the mtmod host.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project config file looked up in the working directory
pub const CONFIG_FILE: &str = "mtmod.toml";

/// Prefix of environment overrides (`MTMOD_ENTRY`, `MTMOD_DEBUG`, ...)
pub const ENV_PREFIX: &str = "MTMOD_";

/// Configuration for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entry module identifier
    pub entry: Option<String>,

    /// Module base: a directory or an http(s) URL
    pub base: String,

    /// Debug logging
    pub debug: bool,

    /// Gate the entry load until the base is reachable
    pub wait_for_ready: bool,

    /// Readiness timeout in seconds
    pub ready_timeout: u64,

    /// Suffix appended to every module name
    pub suffix: String,

    /// Print the entry module's exports as JSON
    pub print_exports: bool,

    /// Problems found while applying settings, reported once logging is up
    #[serde(skip)]
    warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: None,
            base: ".".to_string(),
            debug: false,
            wait_for_ready: true,
            ready_timeout: 30,
            suffix: mtmod_loader::DEFAULT_SUFFIX.to_string(),
            print_exports: false,
            warnings: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the config file, then environment.
    ///
    /// An explicit `path` must exist; otherwise `mtmod.toml` is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let project = PathBuf::from(CONFIG_FILE);
                if project.exists() {
                    Self::from_file(&project)?
                } else {
                    Config::default()
                }
            }
        };

        config.load_from_env();

        Ok(config)
    }

    /// Parse a TOML config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load configuration from environment variables.
    fn load_from_env(&mut self) {
        self.merge_env(std::env::vars());
    }

    /// Apply `MTMOD_*` pairs; other keys are ignored.
    pub fn merge_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value);
            }
        }
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "entry" => self.entry = Some(value.to_string()).filter(|v| !v.is_empty()),
            "base" => self.base = value.to_string(),
            "debug" => self.debug = value == "true",
            "wait-for-ready" => self.wait_for_ready = value != "false",
            "ready-timeout" => match value.parse() {
                Ok(secs) => self.ready_timeout = secs,
                Err(_) => self
                    .warnings
                    .push(format!("ignoring invalid ready-timeout '{}'", value)),
            },
            "suffix" => self.suffix = value.to_string(),
            "print-exports" => self.print_exports = value == "true",
            _ => self
                .warnings
                .push(format!("ignoring unknown configuration key '{}'", key)),
        }
    }

    /// Drain warnings collected by [`Config::set`]
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Readiness timeout as a duration
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout)
    }

    /// The entry identifier, or an error when none is configured
    pub fn require_entry(&self) -> Result<&str> {
        match self.entry.as_deref() {
            Some(entry) => Ok(entry),
            None => bail!(
                "No entry module configured (pass ENTRY, set `entry` in {} or {}ENTRY)",
                CONFIG_FILE,
                ENV_PREFIX
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.entry, None);
        assert_eq!(config.base, ".");
        assert!(!config.debug);
        assert!(config.wait_for_ready);
        assert_eq!(config.ready_timeout(), Duration::from_secs(30));
        assert_eq!(config.suffix, ".js");
        assert!(config.require_entry().is_err());
    }

    #[test]
    fn test_file_keeps_defaults_for_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mtmod.toml");
        std::fs::write(&path, "entry = \"app/main\"\nbase = \"http://localhost:8080/js\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.require_entry().unwrap(), "app/main");
        assert_eq!(config.base, "http://localhost:8080/js");
        assert!(config.wait_for_ready);
        assert_eq!(config.suffix, ".js");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "ready_timeout = \"soon\"").unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.merge_env(vars(&[
            ("MTMOD_ENTRY", "main"),
            ("MTMOD_DEBUG", "true"),
            ("MTMOD_WAIT_FOR_READY", "false"),
            ("MTMOD_READY_TIMEOUT", "5"),
            ("PATH", "/usr/bin"),
        ]));
        assert_eq!(config.entry.as_deref(), Some("main"));
        assert!(config.debug);
        assert!(!config.wait_for_ready);
        assert_eq!(config.ready_timeout, 5);
    }

    #[test]
    fn test_boolean_strings() {
        let mut config = Config::default();
        config.set("debug", "yes");
        config.set("wait-for-ready", "no");
        assert!(!config.debug);
        assert!(config.wait_for_ready);

        config.set("ready-timeout", "later");
        assert_eq!(config.ready_timeout, 30);
    }

    #[test]
    fn test_rejected_settings_are_kept_for_reporting() {
        let mut config = Config::default();
        config.merge_env(vars(&[("MTMOD_READY_TIMEOUT", "abc"), ("MTMOD_COLOUR", "red")]));
        assert_eq!(config.ready_timeout, 30);

        let warnings = config.take_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("ready-timeout 'abc'")));
        assert!(warnings.iter().any(|w| w.contains("key 'colour'")));
        assert!(config.take_warnings().is_empty());
    }
}
