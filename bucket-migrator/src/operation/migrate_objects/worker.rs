/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_channel::{Receiver, Sender};

use crate::error;
use crate::types::{FailedTransfer, FailedTransferPolicy, ObjectDescriptor};

use super::list_objects::ListObjectsStream;
use super::transfer::transfer_object;
use super::MigrateObjectsContext;

// worker to enumerate objects from the source store
pub(super) async fn discover_objects(
    ctx: MigrateObjectsContext,
    work_tx: Sender<ObjectDescriptor>,
) -> Result<(), error::Error> {
    let mut stream = ListObjectsStream::new(ctx.clone());
    let mut cancel_rx = ctx.state.cancel_rx.clone();
    let dry_run = ctx.state.input.dry_run();

    loop {
        tokio::select! {
            _ = cancel_rx.changed() => {
                tracing::error!("received cancellation signal, exiting and not listing new objects");
                return Err(error::operation_cancelled());
            }
            obj_result = stream.next() => {
                match obj_result {
                    None => break,
                    Some(Err(err)) => {
                        tracing::error!("listing the source failed, stopping the migration");
                        // stop workers from taking objects that are already queued
                        ctx.state.cancel();
                        return Err(err);
                    }
                    Some(Ok(object)) => {
                        ctx.state.record_listed(&object);
                        ctx.handle.metrics.increment_objects_listed(1);

                        if dry_run {
                            tracing::info!("dry run, would copy {:?} ({} bytes)", object.key(), object.size());
                            continue;
                        }

                        if work_tx.send(object).await.is_err() {
                            tracing::error!("all receiver ends have been dropped, unable to send a job!");
                            break;
                        }
                    }
                }
            }
        }
    }

    tracing::debug!("finished listing the source");
    Ok(())
}

// worker to move objects from the source to the destination
pub(super) async fn migrate_objects(
    ctx: MigrateObjectsContext,
    work_rx: Receiver<ObjectDescriptor>,
) -> Result<(), error::Error> {
    let mut cancel_rx = ctx.state.cancel_rx.clone();
    loop {
        tokio::select! {
            _ = cancel_rx.changed() => {
                tracing::error!("received cancellation signal, exiting and not copying a new object");
                return Err(error::operation_cancelled());
            }
            job = work_rx.recv() => {
                match job {
                    Err(_) => break,
                    Ok(object) => {
                        // the select may pick up a queued job after cancellation was requested
                        if ctx.state.is_cancelled() {
                            return Err(error::operation_cancelled());
                        }
                        tracing::debug!(
                            "worker recv'd request for key {:?} ({} bytes)",
                            object.key(),
                            object.size()
                        );
                        migrate_single_object(&ctx, object).await?;
                    }
                }
            }
        }
    }

    Ok(())
}

async fn migrate_single_object(
    ctx: &MigrateObjectsContext,
    object: ObjectDescriptor,
) -> Result<(), error::Error> {
    let metrics = &ctx.handle.metrics;
    metrics.increment_transfers_initiated();

    let (outcome, err) = transfer_object(ctx, object).await;
    let err = match err {
        None => {
            ctx.state.record_copied(outcome.bytes_transferred);
            metrics.increment_transfers_completed();
            metrics.add_bytes_transferred(outcome.bytes_transferred);
            return Ok(());
        }
        Some(err) => err,
    };

    metrics.increment_transfers_failed();
    match ctx.state.input.failure_policy() {
        FailedTransferPolicy::Abort => {
            ctx.state.record_failed(None);
            if !err.is_cancellation() {
                ctx.state.cancel();
            }
            Err(err)
        }
        FailedTransferPolicy::Continue => {
            ctx.state.record_failed(Some(FailedTransfer {
                key: outcome.key,
                attempts: outcome.attempts,
                error: err,
            }));
            Ok(())
        }
    }
}
