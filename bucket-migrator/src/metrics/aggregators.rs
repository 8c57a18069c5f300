/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::metrics::instruments::{Gauge, IncreasingCounter};

/// Client-level metrics aggregating every migration run by a [`Client`](crate::Client)
#[derive(Debug, Clone, Default)]
pub struct ClientMetrics {
    /// Total number of objects discovered by listing the source
    objects_listed: IncreasingCounter,
    /// Total number of transfers initiated
    transfers_initiated: IncreasingCounter,
    /// Total number of transfers completed successfully
    transfers_completed: IncreasingCounter,
    /// Total number of transfers that failed after exhausting their attempts
    transfers_failed: IncreasingCounter,
    /// Total number of retried attempts
    retries: IncreasingCounter,
    /// Total bytes written to the destination
    total_bytes_transferred: IncreasingCounter,
    /// Number of currently active transfers
    active_transfers: Gauge,
}

impl ClientMetrics {
    /// Create new client metrics
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_objects_listed(&self, count: u64) {
        self.objects_listed.increment(count);
    }

    /// Increment transfers initiated counter
    pub(crate) fn increment_transfers_initiated(&self) {
        self.transfers_initiated.increment(1);
        self.active_transfers.increment(1);
    }

    /// Increment transfers completed counter
    pub(crate) fn increment_transfers_completed(&self) {
        self.transfers_completed.increment(1);
        self.active_transfers.decrement(1);
    }

    /// Increment transfers failed counter
    pub(crate) fn increment_transfers_failed(&self) {
        self.transfers_failed.increment(1);
        self.active_transfers.decrement(1);
    }

    pub(crate) fn increment_retries(&self) {
        self.retries.increment(1);
    }

    /// Add bytes to total transferred
    pub(crate) fn add_bytes_transferred(&self, bytes: u64) {
        self.total_bytes_transferred.increment(bytes);
    }

    /// Get the number of objects listed
    pub fn objects_listed(&self) -> u64 {
        self.objects_listed.value()
    }

    /// Get the number of transfers initiated
    pub fn transfers_initiated(&self) -> u64 {
        self.transfers_initiated.value()
    }

    /// Get the number of transfers completed
    pub fn transfers_completed(&self) -> u64 {
        self.transfers_completed.value()
    }

    /// Get the number of transfers failed
    pub fn transfers_failed(&self) -> u64 {
        self.transfers_failed.value()
    }

    /// Get the number of retried attempts
    pub fn retries(&self) -> u64 {
        self.retries.value()
    }

    /// Get the total bytes transferred
    pub fn total_bytes_transferred(&self) -> u64 {
        self.total_bytes_transferred.value()
    }

    /// Get the number of currently active transfers
    pub fn active_transfers(&self) -> u64 {
        self.active_transfers.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_transfers_track_outcomes() {
        let metrics = ClientMetrics::new();
        metrics.increment_transfers_initiated();
        metrics.increment_transfers_initiated();
        assert_eq!(2, metrics.active_transfers());

        metrics.increment_transfers_completed();
        metrics.increment_transfers_failed();
        assert_eq!(0, metrics.active_transfers());
        assert_eq!(1, metrics.transfers_completed());
        assert_eq!(1, metrics.transfers_failed());
        assert_eq!(2, metrics.transfers_initiated());
    }
}
