/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::Future;
use std::time::Duration;

use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::time::Instant;
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};

use crate::error::{self, ErrorKind, TransferStage};
use crate::io::detect_content_type;
use crate::metrics::unit::{format_byte_size, format_elapsed};
use crate::store::PutObjectRequest;
use crate::types::{ObjectDescriptor, TransferOutcome};

use super::retry::RetryPolicy;
use super::MigrateObjectsContext;

/// Request to move a single object, one attempt at a time
#[derive(Debug, Clone)]
pub(super) struct TransferRequest {
    pub(super) ctx: MigrateObjectsContext,
    pub(super) object: ObjectDescriptor,
    /// The attempt (starting at 1) this request represents
    pub(super) attempt: u32,
}

/// A successful attempt
#[derive(Debug, Clone)]
pub(super) struct TransferResponse {
    attempt: u32,
    bytes_transferred: u64,
    download_duration: Duration,
    upload_duration: Duration,
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T, error::Error>>,
) -> Result<T, error::Error> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut).await?,
        None => fut.await,
    }
}

/// Run one attempt: download the whole object, then upload it with the configured policy
async fn transfer_handler(request: TransferRequest) -> Result<TransferResponse, error::Error> {
    let TransferRequest {
        ctx,
        object,
        attempt,
    } = request;
    let config = &ctx.handle.config;
    tracing::debug!("starting attempt {attempt} for key {:?}", object.key());

    let started = Instant::now();
    let body = with_timeout(config.io_timeout(), ctx.source().get_object(object.key()))
        .await
        .map_err(|e| error::transfer_failed(attempt, TransferStage::Download, e))?;
    let download_duration = started.elapsed();

    let bytes_transferred = body.len() as u64;
    let put = PutObjectRequest {
        key: object.key().to_owned(),
        content_type: detect_content_type(&body).to_owned(),
        body,
        policy: config.upload_policy().clone(),
    };

    let started = Instant::now();
    with_timeout(config.io_timeout(), ctx.destination().put_object(put))
        .await
        .map_err(|e| error::transfer_failed(attempt, TransferStage::Upload, e))?;
    let upload_duration = started.elapsed();

    Ok(TransferResponse {
        attempt,
        bytes_transferred,
        download_duration,
        upload_duration,
    })
}

/// Create a new tower::Service for moving objects with bounded retries
pub(super) fn transfer_service(
    ctx: &MigrateObjectsContext,
) -> impl Service<TransferRequest, Response = TransferResponse, Error = error::Error, Future: Send>
       + Clone
       + Send {
    let retry = ctx.handle.config.retry();
    ServiceBuilder::new()
        .retry(RetryPolicy::new(
            retry.max_attempts(),
            retry.backoff().clone(),
        ))
        .service(service_fn(transfer_handler))
}

/// Move a single object from the source to the destination.
///
/// Returns the outcome together with the final error when every attempt failed. Exactly
/// one log line at info (success) or error (failure) is emitted per object.
pub(super) async fn transfer_object(
    ctx: &MigrateObjectsContext,
    object: ObjectDescriptor,
) -> (TransferOutcome, Option<error::Error>) {
    let key = object.key().to_owned();
    let listed_size = object.size();
    let request = TransferRequest {
        ctx: ctx.clone(),
        object,
        attempt: 1,
    };

    let started = Instant::now();
    let result = transfer_service(ctx).oneshot(request).await;
    let elapsed = started.elapsed();

    match result {
        Ok(resp) => {
            tracing::info!(
                "copied {key:?} ({}) after {} attempt(s) in {}, download: {}, upload: {}",
                format_byte_size(resp.bytes_transferred),
                resp.attempt,
                format_elapsed(elapsed),
                format_elapsed(resp.download_duration),
                format_elapsed(resp.upload_duration)
            );
            let outcome = TransferOutcome {
                key,
                success: true,
                attempts: resp.attempt,
                bytes_transferred: resp.bytes_transferred,
                download_duration: resp.download_duration,
                upload_duration: resp.upload_duration,
            };
            (outcome, None)
        }
        Err(err) => {
            let attempts = match err.kind() {
                ErrorKind::TransferFailed(failed) => failed.attempt(),
                _ => ctx.handle.config.retry().max_attempts(),
            };
            tracing::error!(
                "failed to copy {key:?} ({}) after {attempts} attempt(s) in {}: {}",
                format_byte_size(listed_size),
                format_elapsed(elapsed),
                DisplayErrorContext(&err)
            );
            let outcome = TransferOutcome {
                key,
                success: false,
                attempts,
                bytes_transferred: 0,
                download_duration: Duration::ZERO,
                upload_duration: Duration::ZERO,
            };
            (outcome, Some(err))
        }
    }
}
