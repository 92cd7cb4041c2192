// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host: readiness gating and the entry load
//!
//! Module loading is synchronous, so the entry load runs on the blocking
//! pool. The HTTP fetcher blocks on this runtime's handle from there.

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use mtmod_loader::{
    Fetcher, FsFetcher, HttpFetcher, ModuleLoader, ModuleResolver, Object, ScriptEvaluator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, instrument};
use url::Url;

/// Interval between readiness probes
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where module sources come from
#[derive(Debug, Clone, PartialEq)]
pub enum Base {
    /// Local directory
    Dir(PathBuf),
    /// http(s) URL
    Http(Url),
}

impl Base {
    /// Interpret a configured base string
    pub fn parse(base: &str) -> Result<Self> {
        if base.starts_with("http://") || base.starts_with("https://") {
            let url = Url::parse(base).with_context(|| format!("Invalid base URL '{}'", base))?;
            Ok(Base::Http(url))
        } else {
            Ok(Base::Dir(PathBuf::from(base)))
        }
    }

    async fn is_ready(&self, client: &reqwest::Client) -> bool {
        match self {
            Base::Dir(path) => tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false),
            // Any response, even an error status, means the server is up
            Base::Http(url) => client.get(url.clone()).send().await.is_ok(),
        }
    }

    fn fetcher(&self) -> Result<Arc<dyn Fetcher>> {
        let fetcher: Arc<dyn Fetcher> = match self {
            Base::Dir(path) => Arc::new(FsFetcher::new(path)),
            Base::Http(url) => Arc::new(HttpFetcher::new(url.as_str(), Handle::current())?),
        };
        Ok(fetcher)
    }
}

/// Poll until `base` is available, failing after `timeout`
#[instrument(skip(base), fields(base = ?base))]
pub async fn wait_until_ready(base: &Base, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let probe = async {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            if base.is_ready(&client).await {
                return;
            }
            debug!("module base not ready yet");
        }
    };

    tokio::time::timeout(timeout, probe)
        .await
        .map_err(|_| anyhow!("Module base not ready after {}s", timeout.as_secs_f64()))?;

    info!("module base ready");
    Ok(())
}

/// Load the configured entry module and return its exports
pub async fn run(config: &Config) -> Result<Object> {
    let entry = config.require_entry()?.to_string();
    let base = Base::parse(&config.base)?;

    if config.wait_for_ready {
        wait_until_ready(&base, config.ready_timeout()).await?;
    }

    let loader = Arc::new(ModuleLoader::with_resolver(
        ModuleResolver::with_suffix(config.suffix.clone()),
        base.fetcher()?,
        ScriptEvaluator::new(),
    ));

    let worker = Arc::clone(&loader);
    let target = entry.clone();
    let exports = tokio::task::spawn_blocking(move || worker.load_entry(&target))
        .await
        .context("Module loader task panicked")?
        .with_context(|| format!("Failed to load entry module '{}'", entry))?;

    debug!(modules = ?loader.cache().locations(), "loaded modules");

    Ok(exports)
}
