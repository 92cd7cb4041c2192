// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! HTTP fetcher
//!
//! Loads are synchronous, so this fetcher blocks on an async `reqwest`
//! request. Call it from a blocking context such as `spawn_blocking`; calling
//! it from inside an async task panics in `Handle::block_on`.

use crate::error::FetchError;
use crate::fetch::Fetcher;
use reqwest::Client;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, instrument};
use url::Url;

/// Fetches modules relative to a base URL
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
    handle: Handle,
}

impl HttpFetcher {
    /// Create a fetcher for `base`, driving requests on `handle`
    pub fn new(base: &str, handle: Handle) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(format!("mtmod/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: base_url(base)?,
            handle,
        })
    }

    /// Base URL locations are joined onto
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL a location is fetched from
    pub fn url_for(&self, location: &str) -> Result<Url, FetchError> {
        if location.starts_with('/') || location.split('/').any(|s| s == "..") {
            return Err(FetchError::OutsideRoot(location.to_string()));
        }
        // join() also honours encoded dot segments such as `%2e%2e`
        let url = self.base.join(location)?;
        if url.origin() != self.base.origin() || !url.path().starts_with(self.base.path()) {
            return Err(FetchError::OutsideRoot(location.to_string()));
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let url = self.url_for(location)?;
        debug!(%url, "fetching module over HTTP");
        self.handle.block_on(self.get(url))
    }
}

/// Parse a base URL, making sure relative joins stay below its path
fn base_url(base: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: &str) -> (tokio::runtime::Runtime, HttpFetcher) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let fetcher = HttpFetcher::new(base, runtime.handle().clone()).unwrap();
        (runtime, fetcher)
    }

    #[test]
    fn test_joins_below_base_path() {
        let (_rt, fetcher) = fetcher("http://localhost:8080/static");
        assert_eq!(fetcher.base().as_str(), "http://localhost:8080/static/");
        assert_eq!(
            fetcher.url_for("lib/util.js").unwrap().as_str(),
            "http://localhost:8080/static/lib/util.js"
        );
    }

    #[test]
    fn test_refuses_escaping_locations() {
        let (_rt, fetcher) = fetcher("http://localhost:8080/static/");
        assert!(matches!(fetcher.url_for("../x.js"), Err(FetchError::OutsideRoot(_))));
        assert!(matches!(fetcher.url_for("/x.js"), Err(FetchError::OutsideRoot(_))));
        assert!(matches!(
            fetcher.url_for("%2e%2e/%2e%2e/secret.js"),
            Err(FetchError::OutsideRoot(_))
        ));
        assert!(matches!(fetcher.url_for("//evil.example/x.js"), Err(FetchError::OutsideRoot(_))));
    }

    #[test]
    fn test_non_success_status_is_an_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
        let addr = listener.local_addr().unwrap();
        runtime.spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        });

        let base = format!("http://{}/js/", addr);
        let fetcher = HttpFetcher::new(&base, runtime.handle().clone()).unwrap();
        match fetcher.fetch("missing.js") {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(status, 404);
                assert_eq!(url, format!("{}missing.js", base));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        assert!(HttpFetcher::new("not a url", runtime.handle().clone()).is_err());
    }
}
