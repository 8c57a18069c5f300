/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{fmt, time::Duration};

/// Binary (1024 based) byte units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    /// 1 byte
    Byte,
    /// 2<sup>10</sup> bytes.
    Kilobyte,
    /// 2<sup>20</sup> bytes.
    Megabyte,
    /// 2<sup>30</sup> bytes.
    Gigabyte,
    /// 2<sup>40</sup> bytes.
    Terabyte,
    /// 2<sup>50</sup> bytes.
    Petabyte,
    /// 2<sup>60</sup> bytes.
    Exabyte,
}

/// Every unit, largest first
const UNITS_DESCENDING: &[ByteUnit] = &[
    ByteUnit::Exabyte,
    ByteUnit::Petabyte,
    ByteUnit::Terabyte,
    ByteUnit::Gigabyte,
    ByteUnit::Megabyte,
    ByteUnit::Kilobyte,
];

impl ByteUnit {
    /// Convert some number of bytes into this unit as an `f64`
    pub fn convert(&self, bytes: u64) -> f64 {
        bytes as f64 / self.as_bytes_u64() as f64
    }

    /// The largest unit that is not bigger than `total_bytes` (bytes for anything below 1KB)
    pub fn best_fit(total_bytes: u64) -> ByteUnit {
        UNITS_DESCENDING
            .iter()
            .copied()
            .find(|u| total_bytes >= u.as_bytes_u64())
            .unwrap_or(ByteUnit::Byte)
    }

    /// Figure out the best unit to display the given number of bytes in
    /// and return a [`ByteCountDisplayContext`] with the appropriate units set
    pub fn display(total_bytes: u64) -> ByteCountDisplayContext {
        ByteCountDisplayContext::new(total_bytes, Self::best_fit(total_bytes))
    }

    /// The number of bytes represented by this unit
    pub const fn as_bytes_u64(&self) -> u64 {
        1 << (10 * self.exponent())
    }

    const fn exponent(&self) -> u32 {
        match self {
            ByteUnit::Byte => 0,
            ByteUnit::Kilobyte => 1,
            ByteUnit::Megabyte => 2,
            ByteUnit::Gigabyte => 3,
            ByteUnit::Terabyte => 4,
            ByteUnit::Petabyte => 5,
            ByteUnit::Exabyte => 6,
        }
    }

    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            ByteUnit::Byte => "B",
            ByteUnit::Kilobyte => "KB",
            ByteUnit::Megabyte => "MB",
            ByteUnit::Gigabyte => "GB",
            ByteUnit::Terabyte => "TB",
            ByteUnit::Petabyte => "PB",
            ByteUnit::Exabyte => "EB",
        }
    }
}

/// Display context to format a number of bytes in a particular unit.
///
/// Two decimals are used unless the formatter requests a different precision.
#[derive(Debug)]
pub struct ByteCountDisplayContext {
    /// The number of bytes to display
    pub total_bytes: u64,
    /// The precise unit to display the bytes as
    pub unit: ByteUnit,
}

impl ByteCountDisplayContext {
    /// Create a new display context for the number of bytes in a specific unit
    pub fn new(total_bytes: u64, unit: ByteUnit) -> Self {
        Self { total_bytes, unit }
    }
}

impl fmt::Display for ByteCountDisplayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "{1:.*}{2:}",
            precision,
            self.unit.convert(self.total_bytes),
            self.unit.as_str()
        )
    }
}

/// Render a byte count using the largest fitting binary unit with two decimals.
///
/// ```
/// use bucket_migrator::metrics::unit::format_byte_size;
/// assert_eq!("0.00B", format_byte_size(0));
/// assert_eq!("1.50KB", format_byte_size(1536));
/// ```
pub fn format_byte_size(bytes: u64) -> String {
    ByteUnit::display(bytes).to_string()
}

/// Render a duration as seconds with two decimals (e.g. `1.50s`)
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}
