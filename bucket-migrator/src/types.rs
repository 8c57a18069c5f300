/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};

/// A single object discovered while listing the source store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    key: String,
    size: u64,
}

impl ObjectDescriptor {
    /// Create a new descriptor for the object at `key` with `size` bytes
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// The object key. The destination key is always the same as the source key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The object size in bytes as reported by the listing
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Opaque continuation token representing a position in a paginated listing.
///
/// The initial value is [`PageCursor::start`]. Stores hand back the cursor to use for
/// the following page alongside each page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor(Option<String>);

impl PageCursor {
    /// The cursor used to request the first page of a listing
    pub fn start() -> Self {
        Self(None)
    }

    /// Create a cursor from a store provided continuation token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Returns true if this cursor points at the first page of a listing
    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }

    /// The continuation token, if any
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for PageCursor {
    fn from(value: Option<String>) -> Self {
        Self(value.filter(|token| !token.is_empty()))
    }
}

/// The result of running a single transfer unit (download then upload) for one object.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// The object key
    pub key: String,
    /// Whether the object reached the destination
    pub success: bool,
    /// Number of attempts made, including the successful one
    pub attempts: u32,
    /// Number of bytes written to the destination (zero on failure)
    pub bytes_transferred: u64,
    /// Time spent downloading the object on the final attempt
    pub download_duration: Duration,
    /// Time spent uploading the object on the final attempt
    pub upload_duration: Duration,
}

/// The concurrency settings to use for a migration.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Automatically configure the number of workers.
    #[default]
    Auto,

    /// Explicitly configured number of workers. `Explicit(1)` transfers objects
    /// one at a time in listing order.
    Explicit(usize),
}

/// Delay applied between attempts of a single transfer unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,

    /// Wait the same amount of time before every retry
    Fixed(Duration),

    /// Double the delay after every failed attempt, starting at `initial`, capped at `max`
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Upper bound on any single delay
        max: Duration,
    },
}

impl Backoff {
    /// The delay to wait after `failed_attempt` (starting at 1) failed
    pub fn delay(&self, failed_attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let shift = failed_attempt.saturating_sub(1).min(31);
                initial.saturating_mul(1 << shift).min(*max)
            }
        }
    }
}

/// Bounded retry behavior of a transfer unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryConfig {
    /// Default number of attempts made for every object
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Create a retry configuration allowing `max_attempts` attempts per object
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// The maximum number of attempts (including the first) per object
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay policy between attempts
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Backoff::None)
    }
}

/// Metadata applied uniformly to every object written to the destination store.
///
/// The default matches what the migration has always written: publicly readable objects
/// served as attachments, AES256 server side encryption and the standard storage class.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    acl: ObjectCannedAcl,
    content_disposition: String,
    server_side_encryption: ServerSideEncryption,
    storage_class: StorageClass,
}

impl UploadPolicy {
    /// Create a new upload policy
    pub fn new(
        acl: ObjectCannedAcl,
        content_disposition: impl Into<String>,
        server_side_encryption: ServerSideEncryption,
        storage_class: StorageClass,
    ) -> Self {
        Self {
            acl,
            content_disposition: content_disposition.into(),
            server_side_encryption,
            storage_class,
        }
    }

    /// The canned ACL (visibility) of every uploaded object
    pub fn acl(&self) -> &ObjectCannedAcl {
        &self.acl
    }

    /// The `Content-Disposition` of every uploaded object
    pub fn content_disposition(&self) -> &str {
        &self.content_disposition
    }

    /// The server side encryption of every uploaded object
    pub fn server_side_encryption(&self) -> &ServerSideEncryption {
        &self.server_side_encryption
    }

    /// The storage class of every uploaded object
    pub fn storage_class(&self) -> &StorageClass {
        &self.storage_class
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            ObjectCannedAcl::PublicRead,
            "attachment",
            ServerSideEncryption::Aes256,
            StorageClass::Standard,
        )
    }
}

/// Policy for how to handle an object that could not be migrated after
/// exhausting its attempts.
///
/// Default is to continue the migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FailedTransferPolicy {
    /// Stop the migration on the first object that permanently fails
    Abort,
    /// Continue the migration. Every failure is logged and the details of all failed
    /// objects will be available in the output after the migration completes.
    #[default]
    Continue,
}

/// Detailed information about an object that could not be migrated
#[non_exhaustive]
#[derive(Debug)]
pub struct FailedTransfer {
    pub(crate) key: String,
    pub(crate) attempts: u32,
    pub(crate) error: crate::error::Error,
}

impl FailedTransfer {
    /// The key of the object that failed
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The error encountered on the final attempt
    pub fn error(&self) -> &crate::error::Error {
        &self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay() {
        assert_eq!(Duration::ZERO, Backoff::None.delay(1));
        assert_eq!(Duration::ZERO, Backoff::None.delay(7));

        let fixed = Backoff::Fixed(Duration::from_millis(250));
        assert_eq!(Duration::from_millis(250), fixed.delay(1));
        assert_eq!(Duration::from_millis(250), fixed.delay(2));

        let exp = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(Duration::from_millis(100), exp.delay(1));
        assert_eq!(Duration::from_millis(200), exp.delay(2));
        assert_eq!(Duration::from_millis(350), exp.delay(3));
        assert_eq!(Duration::from_millis(350), exp.delay(u32::MAX));
    }

    #[test]
    fn test_page_cursor() {
        assert!(PageCursor::start().is_start());
        assert!(PageCursor::from(Some(String::new())).is_start());
        let cursor = PageCursor::from(Some("token-1".to_owned()));
        assert_eq!(Some("token-1"), cursor.token());
        assert!(!cursor.is_start());
    }

    #[test]
    fn test_default_upload_policy() {
        let policy = UploadPolicy::default();
        assert_eq!(&ObjectCannedAcl::PublicRead, policy.acl());
        assert_eq!("attachment", policy.content_disposition());
        assert_eq!(&ServerSideEncryption::Aes256, policy.server_side_encryption());
        assert_eq!(&StorageClass::Standard, policy.storage_class());
    }
}
