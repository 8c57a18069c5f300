/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io::Write;
use std::sync::Arc;

use bucket_migrator::store::in_memory::InMemoryStore;
use bucket_migrator::types::ConcurrencySetting;
use bucket_migrator::{Client, Config};
use bytes::Bytes;
use tempfile::NamedTempFile;

pub use bucket_migrator::store::in_memory::Failures;

/// Random object contents of the given length
pub fn random_bytes(len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    fastrand::fill(&mut data);
    Bytes::from(data)
}

/// Key used for the `i`th object of [`seeded_store`]
pub fn object_key(i: usize) -> String {
    format!("objects/{i:04}")
}

/// A store holding `count` objects with random contents of varying size
pub fn seeded_store(name: &str, count: usize) -> InMemoryStore {
    (0..count).fold(InMemoryStore::new(name), |store, i| {
        store.with_object(object_key(i), random_bytes(16 + i * 7))
    })
}

/// Create a client migrating from `source` to `destination` without backoff between attempts
pub fn client_for(
    source: Arc<InMemoryStore>,
    destination: Arc<InMemoryStore>,
    concurrency: ConcurrencySetting,
) -> Client {
    let config = Config::builder()
        .source(source)
        .destination(destination)
        .concurrency(concurrency)
        .build()
        .unwrap();
    Client::new(config)
}

/// Write `contents` to a temporary file with the given extension (e.g. `yaml` or `json`)
pub fn write_config(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
