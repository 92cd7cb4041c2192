// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source retrieval
//!
//! A [`Fetcher`] turns a canonical location into source text. Failures are
//! always reported; a missing module never becomes an empty one.

mod fs;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use fs::FsFetcher;
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;

use crate::error::FetchError;

/// Retrieves module source text by canonical location
pub trait Fetcher: Send + Sync {
    /// Fetch the source text stored at `location`
    fn fetch(&self, location: &str) -> Result<String, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch(&self, location: &str) -> Result<String, FetchError> {
        (**self).fetch(location)
    }
}
