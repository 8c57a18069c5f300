/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{clamp_page_size, ListObjectsPage, ListObjectsRequest, ObjectStore, PutObjectRequest};
use crate::error::{self, ErrorKind};
use crate::types::{ObjectDescriptor, PageCursor, UploadPolicy};

/// How many times an injected fault fires before the operation starts succeeding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failures {
    /// Fail the next `n` calls
    Times(u32),
    /// Fail every call
    Always,
}

impl Failures {
    /// Consume one failure, returning true if the current call should fail
    fn take(&mut self) -> bool {
        match self {
            Failures::Always => true,
            Failures::Times(0) => false,
            Failures::Times(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// An object as written through [`ObjectStore::put_object`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The object contents
    pub data: Bytes,
    /// The content type recorded on upload (`None` for seeded objects)
    pub content_type: Option<String>,
    /// The upload policy recorded on upload (`None` for seeded objects)
    pub policy: Option<UploadPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Get,
    Put,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    faults: HashMap<(Op, String), Failures>,
    delays: HashMap<(Op, String), Duration>,
    calls: HashMap<(Op, String), u32>,
    list_calls: u32,
    failing_list_call: Option<u32>,
}

/// A key ordered, in-memory [`ObjectStore`] with fault injection and call accounting.
///
/// Listing uses the last key of a page as the continuation token, mirroring a marker
/// based listing API.
#[derive(Debug)]
pub struct InMemoryStore {
    name: String,
    max_page_size: Option<usize>,
    empty_final_page: bool,
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_page_size: None,
            empty_final_page: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Seed the store with an object
    pub fn with_object(self, key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.lock().objects.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: None,
                policy: None,
            },
        );
        self
    }

    /// Limit every page to at most `size` objects regardless of the requested page size
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size.max(1));
        self
    }

    /// Report `has_more` on the last non-empty page and finish the listing with an empty page
    pub fn with_empty_final_page(mut self) -> Self {
        self.empty_final_page = true;
        self
    }

    /// Make `get_object` fail for `key`
    pub fn fail_get(self, key: impl Into<String>, failures: Failures) -> Self {
        self.lock().faults.insert((Op::Get, key.into()), failures);
        self
    }

    /// Make `put_object` fail for `key`
    pub fn fail_put(self, key: impl Into<String>, failures: Failures) -> Self {
        self.lock().faults.insert((Op::Put, key.into()), failures);
        self
    }

    /// Delay every `get_object` call for `key` by `delay` before it completes
    pub fn delay_get(self, key: impl Into<String>, delay: Duration) -> Self {
        self.lock().delays.insert((Op::Get, key.into()), delay);
        self
    }

    /// Delay every `put_object` call for `key` by `delay` before it completes
    pub fn delay_put(self, key: impl Into<String>, delay: Duration) -> Self {
        self.lock().delays.insert((Op::Put, key.into()), delay);
        self
    }

    /// Make the `n`th (starting at 1) `list_objects` call fail
    pub fn fail_list_call(self, n: u32) -> Self {
        self.lock().failing_list_call = Some(n);
        self
    }

    /// The stored contents of `key`
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.lock().objects.get(key).map(|obj| obj.data.clone())
    }

    /// The stored object for `key` including its upload metadata
    pub fn stored_object(&self, key: &str) -> Option<StoredObject> {
        self.lock().objects.get(key).cloned()
    }

    /// All keys currently in the store, in key order
    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Number of `get_object` calls made for `key`
    pub fn get_calls(&self, key: &str) -> u32 {
        self.calls(Op::Get, key)
    }

    /// Number of `put_object` calls made for `key`
    pub fn put_calls(&self, key: &str) -> u32 {
        self.calls(Op::Put, key)
    }

    /// Number of `list_objects` calls made
    pub fn list_calls(&self) -> u32 {
        self.lock().list_calls
    }

    fn calls(&self, op: Op, key: &str) -> u32 {
        self.lock()
            .calls
            .get(&(op, key.to_owned()))
            .copied()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call, wait out any configured delay and return an error if a fault is armed for it
    async fn record(&self, op: Op, key: &str) -> Result<(), error::Error> {
        let id = (op, key.to_owned());
        let (delay, fail) = {
            let mut state = self.lock();
            *state.calls.entry(id.clone()).or_default() += 1;
            let fail = state.faults.get_mut(&id).is_some_and(Failures::take);
            (state.delays.get(&id).copied(), fail)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            let message = format!("injected {op:?} failure for key '{key}'");
            return Err(error::Error::new(ErrorKind::ChildOperationFailed, message));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsPage, error::Error> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.failing_list_call == Some(state.list_calls) {
            return Err(error::Error::new(
                ErrorKind::ChildOperationFailed,
                "injected listing failure",
            ));
        }

        let mut page_size = clamp_page_size(request.max_keys) as usize;
        if let Some(max) = self.max_page_size {
            page_size = page_size.min(max);
        }

        let lower = match request.cursor.token() {
            Some(marker) => Bound::Excluded(marker.to_owned()),
            None => Bound::Unbounded,
        };
        let prefix = request.prefix.unwrap_or_default();
        let mut remaining = state
            .objects
            .range((lower, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(&prefix));

        let objects: Vec<ObjectDescriptor> = remaining
            .by_ref()
            .take(page_size)
            .map(|(key, obj)| ObjectDescriptor::new(key.clone(), obj.data.len() as u64))
            .collect();
        let more_keys = remaining.next().is_some();

        let has_more = more_keys || (self.empty_final_page && !objects.is_empty());
        let next_cursor = match objects.last() {
            Some(last) if has_more => PageCursor::from_token(last.key()),
            _ => PageCursor::start(),
        };

        Ok(ListObjectsPage {
            objects,
            next_cursor,
            has_more,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, error::Error> {
        self.record(Op::Get, key).await?;
        self.lock()
            .objects
            .get(key)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| {
                error::Error::new(ErrorKind::NotFound, format!("no such key '{key}'"))
            })
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<(), error::Error> {
        self.record(Op::Put, &request.key).await?;
        self.lock().objects.insert(
            request.key,
            StoredObject {
                data: request.body,
                content_type: Some(request.content_type),
                policy: Some(request.policy),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(max_keys: i32, cursor: PageCursor) -> ListObjectsRequest {
        ListObjectsRequest {
            max_keys,
            cursor,
            prefix: None,
        }
    }

    #[tokio::test]
    async fn test_marker_pagination() {
        let store = InMemoryStore::new("test")
            .with_object("a", "1")
            .with_object("b", "22")
            .with_object("c", "333");

        let page = store.list_objects(request(2, PageCursor::start())).await.unwrap();
        assert!(page.has_more);
        assert_eq!(Some("b"), page.next_cursor.token());
        assert_eq!(2, page.objects.len());

        let page = store.list_objects(request(2, page.next_cursor)).await.unwrap();
        assert!(!page.has_more);
        assert_eq!(vec![ObjectDescriptor::new("c", 3)], page.objects);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = InMemoryStore::new("test")
            .with_object("a", "1")
            .fail_get("a", Failures::Times(1));

        assert!(store.get_object("a").await.is_err());
        assert_eq!(Bytes::from_static(b"1"), store.get_object("a").await.unwrap());
        assert_eq!(2, store.get_calls("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_get() {
        let store = InMemoryStore::new("test")
            .with_object("a", "1")
            .delay_get("a", Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        assert_eq!(Bytes::from_static(b"1"), store.get_object("a").await.unwrap());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
