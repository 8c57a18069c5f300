/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use crate::error;
use crate::store::{SharedObjectStore, MAX_PAGE_SIZE};
use crate::types::{Backoff, ConcurrencySetting, RetryConfig, UploadPolicy};

/// Loading configuration from a config file
pub mod loader;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    source: SharedObjectStore,
    destination: SharedObjectStore,
    concurrency: ConcurrencySetting,
    retry: RetryConfig,
    page_size: i32,
    io_timeout: Option<Duration>,
    upload_policy: UploadPolicy,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The store objects are listed and read from
    pub fn source(&self) -> &SharedObjectStore {
        &self.source
    }

    /// The store objects are written to
    pub fn destination(&self) -> &SharedObjectStore {
        &self.destination
    }

    /// Returns the concurrency setting to use for migrations.
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// The bounded retry applied to every object
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Number of objects requested per listing page
    pub fn page_size(&self) -> i32 {
        self.page_size
    }

    /// Upper bound on a single read or write of one object, if any
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    /// Metadata applied to every object written to the destination
    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone)]
pub struct Builder {
    source: Option<SharedObjectStore>,
    destination: Option<SharedObjectStore>,
    concurrency: ConcurrencySetting,
    max_attempts: u32,
    backoff: Backoff,
    page_size: i32,
    io_timeout: Option<Duration>,
    upload_policy: UploadPolicy,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            concurrency: ConcurrencySetting::default(),
            max_attempts: RetryConfig::DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            page_size: MAX_PAGE_SIZE,
            io_timeout: None,
            upload_policy: UploadPolicy::default(),
        }
    }
}

impl Builder {
    /// Set the store to migrate objects from.
    ///
    /// NOTE: A source is required.
    pub fn source(mut self, store: SharedObjectStore) -> Self {
        self.source = Some(store);
        self
    }

    /// Set the store to migrate objects to.
    ///
    /// NOTE: A destination is required.
    pub fn destination(mut self, store: SharedObjectStore) -> Self {
        self.destination = Some(store);
        self
    }

    /// Set the number of objects migrated concurrently.
    ///
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the maximum number of attempts (including the first) for a single object.
    ///
    /// Default is 3. Must be at least 1.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between attempts of a single object.
    ///
    /// Default is [Backoff::None].
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the number of objects requested per listing page.
    ///
    /// Values are clamped to `1..=1000`. Default is 1000.
    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Bound the time a single read or write of one object may take.
    ///
    /// An attempt that exceeds the timeout fails and is retried like any other failure.
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Set the metadata applied to every object written to the destination
    pub fn upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Result<Config, error::Error> {
        let source = self
            .source
            .ok_or_else(|| error::invalid_input("a source store is required"))?;
        let destination = self
            .destination
            .ok_or_else(|| error::invalid_input("a destination store is required"))?;

        if self.max_attempts == 0 {
            return Err(error::invalid_input("max attempts must be at least 1"));
        }
        if let ConcurrencySetting::Explicit(0) = self.concurrency {
            return Err(error::invalid_input("concurrency must be at least 1"));
        }

        Ok(Config {
            source,
            destination,
            concurrency: self.concurrency,
            retry: RetryConfig::new(self.max_attempts, self.backoff),
            page_size: crate::store::clamp_page_size(self.page_size),
            io_timeout: self.io_timeout,
            upload_policy: self.upload_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::store::in_memory::InMemoryStore;

    fn builder() -> Builder {
        Config::builder()
            .source(Arc::new(InMemoryStore::new("source")))
            .destination(Arc::new(InMemoryStore::new("destination")))
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(3, config.retry().max_attempts());
        assert_eq!(&Backoff::None, config.retry().backoff());
        assert_eq!(1000, config.page_size());
        assert!(config.io_timeout().is_none());
        assert_eq!("source", config.source().name());
        assert_eq!("destination", config.destination().name());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = builder().page_size(5000).build().unwrap();
        assert_eq!(1000, config.page_size());
    }

    #[test]
    fn test_invalid_settings() {
        let err = Config::builder().build().unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let err = builder().max_attempts(0).build().unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let err = builder()
            .concurrency(ConcurrencySetting::Explicit(0))
            .build()
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}
