/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::metrics::aggregators::ClientMetrics;
use crate::metrics::unit::format_byte_size;
use crate::types::ConcurrencySetting;
use crate::Config;
use crate::DEFAULT_CONCURRENCY;
use std::sync::Arc;

/// Bucket migration client.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, metrics, etc
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
    pub(crate) metrics: ClientMetrics,
}

impl Handle {
    /// Get the concrete number of workers to use based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Explicit(concurrency) => *concurrency,
            ConcurrencySetting::Auto => DEFAULT_CONCURRENCY,
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        tracing::debug!(
            "Client metrics summary - objects listed: {}, transfers initiated: {}, completed: {}, failed: {}, retries: {}, total bytes: {}",
            self.metrics.objects_listed(),
            self.metrics.transfers_initiated(),
            self.metrics.transfers_completed(),
            self.metrics.transfers_failed(),
            self.metrics.retries(),
            format_byte_size(self.metrics.total_bytes_transferred())
        );
    }
}

impl Client {
    /// Creates a new client from a migration config.
    pub fn new(config: Config) -> Client {
        let metrics = ClientMetrics::new();
        let handle = Arc::new(Handle { config, metrics });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Returns the client's metrics
    pub fn metrics(&self) -> &ClientMetrics {
        &self.handle.metrics
    }

    /// Check that both the source and destination stores are reachable
    pub async fn verify(&self) -> Result<(), crate::error::Error> {
        self.handle.config.source().verify().await?;
        self.handle.config.destination().verify().await?;
        Ok(())
    }

    /// Copy every object from the source store to the destination store.
    ///
    /// Constructs a fluent builder for the
    /// [`MigrateObjects`](crate::operation::migrate_objects::builders::MigrateObjectsFluentBuilder) operation.
    ///
    /// # Examples
    /// ```no_run
    /// use bucket_migrator::error::Error;
    ///
    /// async fn migrate(client: &bucket_migrator::Client) -> Result<(), Error> {
    ///     let handle = client
    ///         .migrate_objects()
    ///         .key_prefix("2024/")
    ///         .send()
    ///         .await?;
    ///
    ///     // wait for the migration to complete
    ///     let output = handle.join().await?;
    ///     println!("copied = {}, failed = {}", output.objects_copied(), output.objects_failed());
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn migrate_objects(
        &self,
    ) -> crate::operation::migrate_objects::builders::MigrateObjectsFluentBuilder {
        crate::operation::migrate_objects::builders::MigrateObjectsFluentBuilder::new(
            self.handle.clone(),
        )
    }
}
