/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// A monotonically increasing numeric value.
#[derive(Debug, Clone, Default)]
pub struct IncreasingCounter {
    value: Arc<AtomicU64>,
}

impl IncreasingCounter {
    /// Create a new counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter by the given amount and return the new value.
    pub fn increment(&self, amount: u64) -> u64 {
        self.value.fetch_add(amount, Ordering::Relaxed) + amount
    }

    /// Get the current value of the counter.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A value that can increase or decrease over time.
/// Minimum value is 0.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    value: Arc<AtomicU64>,
}

impl Gauge {
    /// Create a new gauge starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the gauge by the given amount and return the new value.
    pub fn increment(&self, amount: u64) -> u64 {
        self.value.fetch_add(amount, Ordering::Relaxed) + amount
    }

    /// Decrement the gauge by the given amount and return the new value.
    /// The gauge saturates at 0.
    pub fn decrement(&self, amount: u64) -> u64 {
        let prev = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(amount))
            })
            .unwrap_or_default();
        prev.saturating_sub(amount)
    }

    /// Get the current value of the gauge.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = IncreasingCounter::new();
        assert_eq!(5, counter.increment(5));
        let shared = counter.clone();
        assert_eq!(7, shared.increment(2));
        assert_eq!(7, counter.value());
    }

    #[test]
    fn test_gauge_saturates() {
        let gauge = Gauge::new();
        assert_eq!(2, gauge.increment(2));
        assert_eq!(1, gauge.decrement(1));
        assert_eq!(0, gauge.decrement(5));
        assert_eq!(0, gauge.value());
    }
}
