/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::time::Sleep;

use crate::types::Backoff;

use super::transfer::{TransferRequest, TransferResponse};

/// A `tower::retry::Policy` implementation that gives every object a bounded number of attempts.
///
/// Each retry repeats the whole download and upload. The delay before a retry comes from
/// the configured [`Backoff`].
#[derive(Debug, Clone)]
pub(super) struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub(super) fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

impl tower::retry::Policy<TransferRequest, TransferResponse, crate::error::Error> for RetryPolicy {
    type Future = Sleep;

    fn retry(
        &mut self,
        req: &mut TransferRequest,
        result: &mut Result<TransferResponse, crate::error::Error>,
    ) -> Option<Self::Future> {
        let err = match result {
            Ok(_) => return None,
            Err(err) => err,
        };

        if err.is_cancellation() || req.attempt >= self.max_attempts {
            return None;
        }

        tracing::warn!(
            "attempt {}/{} for key {:?} failed, retrying: {}",
            req.attempt,
            self.max_attempts,
            req.object.key(),
            DisplayErrorContext(&*err)
        );
        req.ctx.handle.metrics.increment_retries();

        let delay = self.backoff.delay(req.attempt);
        req.attempt += 1;
        Some(tokio::time::sleep(delay))
    }

    fn clone_request(&mut self, req: &TransferRequest) -> Option<TransferRequest> {
        Some(req.clone())
    }
}
