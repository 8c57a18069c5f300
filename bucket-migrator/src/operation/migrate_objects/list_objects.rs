/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::VecDeque;
use std::mem;

use crate::error;
use crate::store::{ListObjectsPage, ListObjectsRequest};
use crate::types::{ObjectDescriptor, PageCursor};

use super::MigrateObjectsContext;

/// Paginator over the source listing that walks pages until the store reports the last one.
#[derive(Debug)]
struct ListObjectsPaginator {
    context: MigrateObjectsContext,
    state: State,
}

#[derive(Debug, PartialEq)]
enum State {
    Paginating { cursor: PageCursor },
    Done,
}

impl State {
    fn next_state(self, page: &ListObjectsPage) -> Result<State, error::Error> {
        match self {
            State::Paginating { cursor } if page.has_more => {
                // a page claiming more results must move the cursor forward
                if page.next_cursor.is_start() || page.next_cursor == cursor {
                    return Err(error::listing_failed(format!(
                        "listing reported more results without advancing past {:?}",
                        cursor.token()
                    )));
                }
                Ok(State::Paginating {
                    cursor: page.next_cursor.clone(),
                })
            }
            State::Paginating { .. } | State::Done => Ok(State::Done),
        }
    }
}

impl ListObjectsPaginator {
    fn new(context: MigrateObjectsContext) -> Self {
        Self {
            context,
            state: State::Paginating {
                cursor: PageCursor::start(),
            },
        }
    }

    async fn next_page(&mut self) -> Option<Result<ListObjectsPage, error::Error>> {
        let cursor = match &self.state {
            State::Done => return None,
            State::Paginating { cursor } => cursor.clone(),
        };

        let request = ListObjectsRequest {
            max_keys: self.context.handle.config.page_size(),
            cursor,
            prefix: self.context.state.input.key_prefix.clone(),
        };

        let result = match self.context.source().list_objects(request).await {
            Ok(page) => {
                let prev_state = mem::replace(&mut self.state, State::Done);
                prev_state.next_state(&page).map(|next_state| {
                    self.state = next_state;
                    page
                })
            }
            Err(err) => Err(error::listing_failed(err)),
        };

        if result.is_err() {
            self.state = State::Done;
        }
        Some(result)
    }
}

/// Stream of every object in the source listing, in listing order
#[derive(Debug)]
pub(super) struct ListObjectsStream {
    paginator: ListObjectsPaginator,
    current_page: VecDeque<ObjectDescriptor>,
}

impl ListObjectsStream {
    pub(super) fn new(context: MigrateObjectsContext) -> Self {
        Self {
            paginator: ListObjectsPaginator::new(context),
            current_page: VecDeque::new(),
        }
    }

    /// The next object, fetching pages as needed. Empty pages are skipped.
    pub(super) async fn next(&mut self) -> Option<Result<ObjectDescriptor, error::Error>> {
        loop {
            if let Some(object) = self.current_page.pop_front() {
                return Some(Ok(object));
            }

            match self.paginator.next_page().await? {
                Ok(page) => {
                    tracing::debug!(
                        "listed page of {} objects, more pages: {}",
                        page.objects.len(),
                        page.has_more
                    );
                    self.current_page.extend(page.objects);
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ListObjectsStream, State};
    use crate::error::ErrorKind;
    use crate::operation::migrate_objects::{MigrateObjectsContext, MigrateObjectsInput};
    use crate::store::in_memory::InMemoryStore;
    use crate::store::ListObjectsPage;
    use crate::types::{ObjectDescriptor, PageCursor};
    use crate::{Client, Config};

    fn page(next: Option<&str>, has_more: bool, keys: &[&str]) -> ListObjectsPage {
        ListObjectsPage {
            objects: keys.iter().map(|k| ObjectDescriptor::new(*k, 1)).collect(),
            next_cursor: PageCursor::from(next.map(str::to_owned)),
            has_more,
        }
    }

    fn context(source: InMemoryStore, input: MigrateObjectsInput) -> MigrateObjectsContext {
        let config = Config::builder()
            .source(Arc::new(source))
            .destination(Arc::new(InMemoryStore::new("destination")))
            .build()
            .unwrap();
        let client = Client::new(config);
        MigrateObjectsContext::new(client.handle.clone(), input)
    }

    async fn collect_keys(mut stream: ListObjectsStream) -> Vec<String> {
        let mut keys = Vec::new();
        while let Some(object) = stream.next().await {
            keys.push(object.unwrap().key().to_owned());
        }
        keys
    }

    #[test]
    fn test_next_state() {
        let start = State::Paginating {
            cursor: PageCursor::start(),
        };

        let state2 = start.next_state(&page(Some("b"), true, &["a", "b"])).unwrap();
        assert_eq!(
            state2,
            State::Paginating {
                cursor: PageCursor::from_token("b")
            }
        );

        let state3 = state2.next_state(&page(None, false, &["c"])).unwrap();
        assert_eq!(state3, State::Done);
        assert_eq!(State::Done, state3.next_state(&page(None, false, &[])).unwrap());
    }

    #[test]
    fn test_cursor_must_advance() {
        let state = State::Paginating {
            cursor: PageCursor::from_token("b"),
        };
        let err = state
            .next_state(&page(Some("b"), true, &["c"]))
            .unwrap_err();
        assert_eq!(&ErrorKind::ListingFailed, err.kind());

        let state = State::Paginating {
            cursor: PageCursor::start(),
        };
        let err = state.next_state(&page(None, true, &["a"])).unwrap_err();
        assert_eq!(&ErrorKind::ListingFailed, err.kind());
    }

    #[tokio::test]
    async fn test_stream_visits_every_page() {
        let source = InMemoryStore::new("source")
            .with_object("k1", "a")
            .with_object("k2", "b")
            .with_object("k3", "c")
            .with_max_page_size(2);
        let ctx = context(source, MigrateObjectsInput::default());

        let keys = collect_keys(ListObjectsStream::new(ctx.clone())).await;
        assert_eq!(vec!["k1", "k2", "k3"], keys);
    }

    #[tokio::test]
    async fn test_stream_with_empty_final_page() {
        let source = InMemoryStore::new("source")
            .with_object("k1", "a")
            .with_object("k2", "b")
            .with_max_page_size(2)
            .with_empty_final_page();
        let source = Arc::new(source);
        let config = Config::builder()
            .source(source.clone())
            .destination(Arc::new(InMemoryStore::new("destination")))
            .build()
            .unwrap();
        let client = Client::new(config);
        let ctx = MigrateObjectsContext::new(client.handle.clone(), MigrateObjectsInput::default());

        let keys = collect_keys(ListObjectsStream::new(ctx)).await;
        assert_eq!(vec!["k1", "k2"], keys);
        assert_eq!(2, source.list_calls());
    }

    #[tokio::test]
    async fn test_stream_with_prefix() {
        let source = InMemoryStore::new("source")
            .with_object("logs/1", "a")
            .with_object("photos/1", "b")
            .with_object("logs/2", "c");
        let input = MigrateObjectsInput::builder()
            .key_prefix("logs/")
            .build()
            .unwrap();
        let ctx = context(source, input);

        let keys = collect_keys(ListObjectsStream::new(ctx)).await;
        assert_eq!(vec!["logs/1", "logs/2"], keys);
    }

    #[tokio::test]
    async fn test_listing_error_ends_stream() {
        let source = InMemoryStore::new("source")
            .with_object("k1", "a")
            .with_object("k2", "b")
            .with_max_page_size(1)
            .fail_list_call(2);
        let ctx = context(source, MigrateObjectsInput::default());
        let mut stream = ListObjectsStream::new(ctx);

        assert_eq!("k1", stream.next().await.unwrap().unwrap().key());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(&ErrorKind::ListingFailed, err.kind());
        assert!(stream.next().await.is_none());
    }
}
