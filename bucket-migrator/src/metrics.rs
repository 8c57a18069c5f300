/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::time::Duration;

/// Metrics aggregators
pub mod aggregators;
/// Instruments for measuring metrics
pub mod instruments;
/// Units of measurement
pub mod unit;

pub use self::unit::{format_byte_size, format_elapsed};

/// Measured bytes transferred over some duration
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    bytes_transferred: u64,
    elapsed: Duration,
}

impl Throughput {
    /// Create a new throughput measurement with the given bytes read and time elapsed
    pub const fn new(bytes_transferred: u64, elapsed: Duration) -> Throughput {
        Throughput {
            bytes_transferred,
            elapsed,
        }
    }

    /// Convert this throughput into a specific unit per second.
    ///
    /// Returns `None` when no time has elapsed.
    pub fn as_unit_per_sec(&self, unit: unit::ByteUnit) -> Option<f64> {
        if self.elapsed.is_zero() {
            return None;
        }
        Some(unit.convert(self.bytes_transferred) / self.elapsed.as_secs_f64())
    }

    /// Convert this throughput into bytes / sec
    pub fn as_bytes_per_sec(&self) -> Option<f64> {
        self.as_unit_per_sec(unit::ByteUnit::Byte)
    }

    /// The number of bytes transferred
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// The time over which the bytes were transferred
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(bytes_per_sec) = self.as_bytes_per_sec() else {
            return f.write_str("n/a");
        };
        let unit = unit::ByteUnit::best_fit(bytes_per_sec as u64);
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "{1:.*}{2}/s",
            precision,
            bytes_per_sec / unit.as_bytes_u64() as f64,
            unit.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{unit::ByteUnit, Throughput};

    #[test]
    fn test_throughput_display() {
        assert_eq!(
            "1.00MB/s",
            Throughput::new(2 * 1024 * 1024, Duration::from_secs(2)).to_string()
        );
        assert_eq!(
            "512.00B/s",
            Throughput::new(256, Duration::from_millis(500)).to_string()
        );
        assert_eq!(
            "1.5KB/s",
            format!("{:.1}", Throughput::new(1536, Duration::from_secs(1)))
        );
        assert_eq!("n/a", Throughput::new(10, Duration::ZERO).to_string());
    }

    #[test]
    fn test_as_unit_per_sec() {
        let t = Throughput::new(15 * ByteUnit::Megabyte.as_bytes_u64(), Duration::from_secs(3));
        assert_eq!(Some(5.0), t.as_unit_per_sec(ByteUnit::Megabyte));
        assert_eq!(
            Some(1024.0),
            Throughput::new(2048, Duration::from_secs(2)).as_bytes_per_sec()
        );
        assert_eq!(None, Throughput::new(2048, Duration::ZERO).as_bytes_per_sec());
    }
}
