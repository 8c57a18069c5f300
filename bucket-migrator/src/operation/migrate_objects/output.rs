/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::metrics::Throughput;
use crate::types::FailedTransfer;

use super::MigrateObjectsState;

/// Output type for migrating objects between stores
#[non_exhaustive]
#[derive(Debug)]
pub struct MigrateObjectsOutput {
    /// The number of objects discovered by listing the source
    pub objects_listed: u64,

    /// The number of objects written to the destination
    pub objects_copied: u64,

    /// The number of objects that exhausted their attempts
    pub objects_failed: u64,

    /// Total number of bytes written to the destination
    pub total_bytes_transferred: u64,

    /// Total size of every listed object as reported by the listing
    pub total_bytes_listed: u64,

    /// A list of failed object transfers
    pub failed_transfers: Option<Vec<FailedTransfer>>,

    /// Wall clock time of the migration
    pub elapsed: Duration,

    /// Whether the migration was cancelled before every listed object was attempted
    pub cancelled: bool,
}

impl MigrateObjectsOutput {
    /// Creates a new builder-style object to manufacture [`MigrateObjectsOutput`](crate::operation::migrate_objects::MigrateObjectsOutput).
    pub fn builder() -> MigrateObjectsOutputBuilder {
        MigrateObjectsOutputBuilder::default()
    }

    /// The number of objects discovered by listing the source
    pub fn objects_listed(&self) -> u64 {
        self.objects_listed
    }

    /// The number of objects written to the destination
    pub fn objects_copied(&self) -> u64 {
        self.objects_copied
    }

    /// The number of objects that exhausted their attempts
    pub fn objects_failed(&self) -> u64 {
        self.objects_failed
    }

    /// Listed objects that were never attempted because the migration was cancelled
    pub fn objects_skipped(&self) -> u64 {
        self.objects_listed
            .saturating_sub(self.objects_copied)
            .saturating_sub(self.objects_failed)
    }

    /// A slice of failed object transfers
    ///
    /// If no value was sent for this field, a default will be set. If you want to determine if no value was
    /// set, use `.failed_transfers.is_none()`
    pub fn failed_transfers(&self) -> &[FailedTransfer] {
        self.failed_transfers.as_deref().unwrap_or_default()
    }

    /// The number of bytes written to the destination
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred
    }

    /// Total size of every listed object as reported by the listing
    pub fn total_bytes_listed(&self) -> u64 {
        self.total_bytes_listed
    }

    /// Wall clock time of the migration
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Bytes written to the destination over the wall clock time of the migration
    pub fn throughput(&self) -> Throughput {
        Throughput::new(self.total_bytes_transferred, self.elapsed)
    }

    /// Whether the migration was cancelled before every listed object was attempted
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl From<&MigrateObjectsState> for MigrateObjectsOutput {
    fn from(state: &MigrateObjectsState) -> Self {
        let failed_transfers = state
            .failed_transfers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();

        MigrateObjectsOutput::builder()
            .objects_listed(state.objects_listed.load(Ordering::SeqCst))
            .objects_copied(state.objects_copied.load(Ordering::SeqCst))
            .objects_failed(state.objects_failed.load(Ordering::SeqCst))
            .total_bytes_transferred(state.total_bytes_transferred.load(Ordering::SeqCst))
            .total_bytes_listed(state.total_bytes_listed.load(Ordering::SeqCst))
            .set_failed_transfers(failed_transfers)
            .elapsed(state.started_at.elapsed())
            .cancelled(state.is_cancelled())
            .build()
    }
}

/// A builder for [`MigrateObjectsOutput`](crate::operation::migrate_objects::MigrateObjectsOutput).
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct MigrateObjectsOutputBuilder {
    pub(crate) objects_listed: u64,
    pub(crate) objects_copied: u64,
    pub(crate) objects_failed: u64,
    pub(crate) total_bytes_transferred: u64,
    pub(crate) total_bytes_listed: u64,
    pub(crate) failed_transfers: Option<Vec<FailedTransfer>>,
    pub(crate) elapsed: Duration,
    pub(crate) cancelled: bool,
}

impl MigrateObjectsOutputBuilder {
    /// The number of objects discovered by listing the source
    pub fn objects_listed(mut self, input: u64) -> Self {
        self.objects_listed = input;
        self
    }

    /// The number of objects written to the destination
    pub fn objects_copied(mut self, input: u64) -> Self {
        self.objects_copied = input;
        self
    }

    /// The number of objects that exhausted their attempts
    pub fn objects_failed(mut self, input: u64) -> Self {
        self.objects_failed = input;
        self
    }

    /// Append a failed transfer.
    ///
    /// To override the contents of this collection use
    /// [`set_failed_transfers`](Self::set_failed_transfers)
    pub fn failed_transfers(mut self, input: FailedTransfer) -> Self {
        self.failed_transfers
            .get_or_insert_with(Vec::new)
            .push(input);
        self
    }

    /// A list of failed object transfers
    pub fn set_failed_transfers(mut self, input: Option<Vec<FailedTransfer>>) -> Self {
        self.failed_transfers = input;
        self
    }

    /// The number of bytes written to the destination
    pub fn total_bytes_transferred(mut self, input: u64) -> Self {
        self.total_bytes_transferred = input;
        self
    }

    /// Total size of every listed object
    pub fn total_bytes_listed(mut self, input: u64) -> Self {
        self.total_bytes_listed = input;
        self
    }

    /// Wall clock time of the migration
    pub fn elapsed(mut self, input: Duration) -> Self {
        self.elapsed = input;
        self
    }

    /// Whether the migration was cancelled
    pub fn cancelled(mut self, input: bool) -> Self {
        self.cancelled = input;
        self
    }

    /// Consume the builder and return the output
    pub fn build(self) -> MigrateObjectsOutput {
        MigrateObjectsOutput {
            objects_listed: self.objects_listed,
            objects_copied: self.objects_copied,
            objects_failed: self.objects_failed,
            total_bytes_transferred: self.total_bytes_transferred,
            total_bytes_listed: self.total_bytes_listed,
            failed_transfers: self.failed_transfers,
            elapsed: self.elapsed,
            cancelled: self.cancelled,
        }
    }
}
