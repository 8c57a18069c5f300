/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of migration errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues
    InputInvalid,

    /// The configuration file is missing a required value or could not be parsed
    ConfigInvalid,

    /// I/O errors
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,

    /// Listing the source store failed. Always fatal to a migration.
    ListingFailed,

    /// A single attempt at moving one object failed
    TransferFailed(TransferFailed),

    /// A single store request did not complete within the configured I/O timeout
    Timeout,

    /// Resource not found (e.g. bucket or key not found)
    NotFound,

    /// child operation failed (e.g. a single store request issued on behalf of a migration)
    ChildOperationFailed,

    /// The operation is being cancelled because the caller requested it or an object
    /// failed under the abort policy.
    OperationCancelled,
}

/// Stores information about a failed transfer attempt
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferFailed {
    attempt: u32,
    stage: TransferStage,
}

/// The half of a transfer attempt that failed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferStage {
    /// Reading the object from the source store
    Download,
    /// Writing the object to the destination store
    Upload,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStage::Download => f.write_str("download"),
            TransferStage::Upload => f.write_str("upload"),
        }
    }
}

impl TransferFailed {
    /// The attempt number (starting at 1) that failed
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Which half of the attempt failed
    pub fn stage(&self) -> TransferStage {
        self.stage
    }
}

impl Error {
    /// Creates a new migration [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this error (or the transfer attempt it wraps) is a cancellation.
    pub(crate) fn is_cancellation(&self) -> bool {
        match &self.kind {
            ErrorKind::OperationCancelled => true,
            ErrorKind::TransferFailed(_) => self
                .source
                .downcast_ref::<Error>()
                .is_some_and(Error::is_cancellation),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
            ErrorKind::ListingFailed => write!(f, "listing source objects failed"),
            ErrorKind::TransferFailed(failed) => {
                write!(f, "{} failed on attempt {}", failed.stage, failed.attempt)
            }
            ErrorKind::Timeout => write!(f, "request timed out"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::ChildOperationFailed => write!(f, "child operation failed"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(value: tokio::time::error::Elapsed) -> Self {
        Self::new(ErrorKind::Timeout, value)
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for Error {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::new(ErrorKind::ConfigInvalid, value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::ConfigInvalid, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        let kind = match value.code() {
            Some("NotFound" | "NoSuchKey" | "NoSuchBucket") => ErrorKind::NotFound,
            _ => ErrorKind::ChildOperationFailed,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn config_invalid<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ConfigInvalid, err)
}

pub(crate) fn listing_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ListingFailed, err)
}

pub(crate) fn transfer_failed<E>(attempt: u32, stage: TransferStage, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(
        ErrorKind::TransferFailed(TransferFailed { attempt, stage }),
        err,
    )
}

pub(crate) fn from_kind<E>(kind: ErrorKind) -> impl FnOnce(E) -> Error
where
    E: Into<BoxError>,
{
    |err| Error::new(kind, err)
}

static CANCELLATION_ERROR: &str =
    "the migration has been cancelled, no new objects will be transferred";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}
