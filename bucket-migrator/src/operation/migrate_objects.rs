/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Instant;

/// Operation builders
pub mod builders;

mod input;
pub use input::{MigrateObjectsInput, MigrateObjectsInputBuilder};

mod handle;
pub use handle::{Canceller, MigrateObjectsHandle};

mod output;
pub use output::{MigrateObjectsOutput, MigrateObjectsOutputBuilder};

mod list_objects;
mod retry;
mod transfer;
mod worker;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::types::{FailedTransfer, ObjectDescriptor};

use super::TransferContext;

/// Operation struct for migrating every object from the source store to the destination store
#[derive(Clone, Default, Debug)]
pub(crate) struct MigrateObjects;

impl MigrateObjects {
    /// Execute a single `MigrateObjects` operation
    pub(crate) async fn orchestrate(
        handle: Arc<crate::client::Handle>,
        input: MigrateObjectsInput,
    ) -> Result<MigrateObjectsHandle, crate::error::Error> {
        let concurrency = handle.num_workers();
        tracing::info!(
            "migrating objects from {:?} to {:?} with {} workers",
            handle.config.source().name(),
            handle.config.destination().name(),
            concurrency
        );
        let ctx = MigrateObjectsContext::new(handle, input);

        // spawn all work into the same JoinSet such that when the set is dropped all tasks are cancelled.
        let mut tasks = JoinSet::new();
        let (work_tx, work_rx) = async_channel::bounded(concurrency);

        // spawn worker to discover/distribute work
        tasks.spawn(
            worker::discover_objects(ctx.clone(), work_tx)
                .instrument(tracing::debug_span!("object-discovery")),
        );

        for i in 0..concurrency {
            let worker = worker::migrate_objects(ctx.clone(), work_rx.clone())
                .instrument(tracing::debug_span!("object-migrator", worker = i));
            tasks.spawn(worker);
        }

        Ok(MigrateObjectsHandle { tasks, ctx })
    }
}

/// MigrateObjects operation specific state
#[derive(Debug)]
pub(crate) struct MigrateObjectsState {
    input: MigrateObjectsInput,
    started_at: Instant,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    failed_transfers: Mutex<Option<Vec<FailedTransfer>>>,
    objects_listed: AtomicU64,
    objects_copied: AtomicU64,
    objects_failed: AtomicU64,
    total_bytes_transferred: AtomicU64,
    total_bytes_listed: AtomicU64,
}

impl MigrateObjectsState {
    fn new(input: MigrateObjectsInput) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            input,
            started_at: Instant::now(),
            cancel_tx,
            cancel_rx,
            failed_transfers: Mutex::new(None),
            objects_listed: AtomicU64::default(),
            objects_copied: AtomicU64::default(),
            objects_failed: AtomicU64::default(),
            total_bytes_transferred: AtomicU64::default(),
            total_bytes_listed: AtomicU64::default(),
        }
    }

    /// Signal every task that no new work should be started
    pub(crate) fn cancel(&self) {
        if self.cancel_tx.send(true).is_err() {
            tracing::warn!("all receiver ends have been dropped, unable to send a cancellation signal");
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    fn record_listed(&self, object: &ObjectDescriptor) {
        self.objects_listed.fetch_add(1, Ordering::SeqCst);
        self.total_bytes_listed
            .fetch_add(object.size(), Ordering::SeqCst);
    }

    fn record_copied(&self, bytes_transferred: u64) {
        self.objects_copied.fetch_add(1, Ordering::SeqCst);
        self.total_bytes_transferred
            .fetch_add(bytes_transferred, Ordering::SeqCst);
    }

    fn record_failed(&self, failed: Option<FailedTransfer>) {
        self.objects_failed.fetch_add(1, Ordering::SeqCst);
        if let Some(failed) = failed {
            self.failed_transfers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get_or_insert_with(Vec::new)
                .push(failed);
        }
    }
}

type MigrateObjectsContext = TransferContext<MigrateObjectsState>;

impl MigrateObjectsContext {
    fn new(handle: Arc<crate::client::Handle>, input: MigrateObjectsInput) -> Self {
        let state = Arc::new(MigrateObjectsState::new(input));
        TransferContext { handle, state }
    }
}
