/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Bucket Migrator
//!
//! Copies every object from a source bucket to a destination bucket. Both buckets are
//! reached through the S3 API, so the source can be any S3 compatible service such as
//! Aliyun OSS. Objects are listed page by page and each one is downloaded and uploaded
//! again by a pool of workers, with a bounded number of attempts per object.
//!
//! # Crate Features
//!
//! - `test-util`: Enables utilities for unit tests. DO NOT ENABLE IN PRODUCTION.
//!
//! # Examples
//!
//! Load the configuration file and migrate the whole source bucket:
//!
//! ```no_run
//! # async fn example() -> Result<(), bucket_migrator::error::Error> {
//! let config = bucket_migrator::from_file("./config.yaml").await?.load().await?;
//! let client = bucket_migrator::Client::new(config);
//!
//! let handle = client.migrate_objects().send().await?;
//!
//! // wait for the migration to complete
//! let output = handle.join().await?;
//! println!("copied = {}, failed = {}", output.objects_copied(), output.objects_failed());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

use std::path::PathBuf;

/// Default number of objects moved in parallel
pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `bucket-migrator`
pub mod error;

/// Common types used by `bucket-migrator`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// Object store abstraction and implementations
pub mod store;

/// Migration client
pub mod client;

/// Migration operations
pub mod operation;

/// Migration configuration
pub mod config;

/// Metrics
pub mod metrics;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader from the configuration file at `path`
pub async fn from_file(path: impl Into<PathBuf>) -> Result<ConfigLoader, error::Error> {
    ConfigLoader::from_path(path).await
}
