/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::task;

use crate::{error::ErrorKind, types::FailedTransferPolicy};

use super::{MigrateObjectsContext, MigrateObjectsOutput, MigrateObjectsState};

/// Handle for `MigrateObjects` operation
///
/// # Cancellation
///
/// The migration can be cancelled by dropping this handle, by calling [`Self::abort`], or
/// through a [`Canceller`] obtained from [`Self::canceller`].
///
/// Dropping the handle cancels every task at its current await point, which may leave an
/// object transfer half done. A cancellation through [`Self::abort`] or a [`Canceller`]
/// stops listing and stops workers from taking new objects, while transfers already in
/// flight run to completion. Listed objects that were never started are reported by
/// [`MigrateObjectsOutput::objects_skipped`].
#[derive(Debug)]
#[non_exhaustive]
pub struct MigrateObjectsHandle {
    /// All child tasks spawned for this migration
    pub(crate) tasks: task::JoinSet<Result<(), crate::error::Error>>,
    /// The context used to drive the migration to completion
    pub(crate) ctx: MigrateObjectsContext,
}

impl MigrateObjectsHandle {
    /// Consume the handle and wait for the migration to complete
    ///
    /// A failure to list the source is always returned as an error. When the
    /// `FailedTransferPolicy` is [`FailedTransferPolicy::Abort`], the first object that
    /// exhausts its attempts is returned as an error as well.
    ///
    /// Otherwise the [`MigrateObjectsOutput`] reports how many objects were copied and how
    /// many failed, including the details of each failure.
    #[tracing::instrument(skip_all, level = "debug", name = "join-migrate-objects")]
    pub async fn join(mut self) -> Result<MigrateObjectsOutput, crate::error::Error> {
        let mut first_error_to_report = None;
        while let Some(join_result) = self.tasks.join_next().await {
            if let Err(e) = join_result? {
                if e.is_cancellation() {
                    tracing::debug!("task exited after cancellation: {e}");
                    continue;
                }
                match (e.kind(), self.ctx.state.input.failure_policy()) {
                    (ErrorKind::ListingFailed, _) | (_, FailedTransferPolicy::Abort) => {
                        if first_error_to_report.is_none() {
                            first_error_to_report = Some(e);
                        }
                    }
                    (_, FailedTransferPolicy::Continue) => {
                        tracing::warn!(
                            "encountered but dismissed error when the failure policy is `Continue`: {}",
                            DisplayErrorContext(&e)
                        )
                    }
                }
            }
        }

        if let Some(e) = first_error_to_report {
            Err(e)
        } else {
            Ok(MigrateObjectsOutput::from(self.ctx.state.as_ref()))
        }
    }

    /// Stop the migration and wait for in-flight transfers to finish.
    ///
    /// No new objects are listed or started. The handle can still be joined afterwards to
    /// obtain the output of the work completed so far.
    pub async fn abort(&mut self) -> Result<(), crate::error::Error> {
        self.ctx.state.cancel();
        while let Some(join_result) = self.tasks.join_next().await {
            if let Err(e) = join_result? {
                tracing::debug!("task exited after abort: {e}");
            }
        }
        Ok(())
    }

    /// A cloneable handle that can cancel this migration from elsewhere (e.g. a signal handler)
    pub fn canceller(&self) -> Canceller {
        Canceller {
            state: self.ctx.state.clone(),
        }
    }
}

/// Cancels a running migration.
///
/// See [`MigrateObjectsHandle`] for the cancellation semantics.
#[derive(Debug, Clone)]
pub struct Canceller {
    state: Arc<MigrateObjectsState>,
}

impl Canceller {
    /// Request cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}
