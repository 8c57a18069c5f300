/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error;
use crate::types::{ObjectDescriptor, PageCursor, UploadPolicy};

/// [`ObjectStore`] backed by an Amazon S3 (or S3 compatible) bucket
pub mod s3;
pub use self::s3::S3ObjectStore;

/// In-memory [`ObjectStore`] for tests
#[cfg(any(test, feature = "test-util"))]
pub mod in_memory;

/// Largest page a single listing request may return
pub const MAX_PAGE_SIZE: i32 = 1000;

/// A shareable handle to an object store
pub type SharedObjectStore = Arc<dyn ObjectStore>;

/// Request for a single page of a listing
#[derive(Debug, Clone)]
pub struct ListObjectsRequest {
    /// The maximum number of objects to return. Capped at [`MAX_PAGE_SIZE`].
    pub max_keys: i32,
    /// Position in the listing to resume from
    pub cursor: PageCursor,
    /// Only list keys starting with this prefix
    pub prefix: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListObjectsPage {
    /// The objects on this page in the store's enumeration order
    pub objects: Vec<ObjectDescriptor>,
    /// The cursor to use for the following page
    pub next_cursor: PageCursor,
    /// False once this is the final page
    pub has_more: bool,
}

/// Request to write a single object
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    /// The destination key
    pub key: String,
    /// The complete object contents
    pub body: Bytes,
    /// The `Content-Type` to store with the object
    pub content_type: String,
    /// Visibility, disposition, encryption and storage class
    pub policy: UploadPolicy,
}

/// The capabilities a migration needs from an object store.
///
/// Both the source and the destination of a migration are accessed through this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// A human readable name for the store (e.g. the bucket name), used in logs
    fn name(&self) -> &str;

    /// Fetch a single page of the listing starting at `request.cursor`
    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsPage, error::Error>;

    /// Read the complete contents of the object at `key`
    async fn get_object(&self, key: &str) -> Result<Bytes, error::Error>;

    /// Write a complete object, replacing any existing object with the same key
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), error::Error>;

    /// Check that the store is reachable and the bucket exists
    async fn verify(&self) -> Result<(), error::Error> {
        Ok(())
    }
}

/// Clamp a requested page size into the range a store accepts
pub(crate) fn clamp_page_size(requested: i32) -> i32 {
    requested.clamp(1, MAX_PAGE_SIZE)
}
