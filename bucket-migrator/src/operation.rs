/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::store::ObjectStore;

/// Types for migrating every object of a store
pub mod migrate_objects;

/// Container for maintaining context required to carry out a single operation/transfer.
///
/// `State` is whatever additional operation specific state is required for the operation.
#[derive(Debug)]
pub(crate) struct TransferContext<State> {
    handle: Arc<crate::client::Handle>,
    state: Arc<State>,
}

impl<State> TransferContext<State> {
    /// The store objects are read from
    pub(crate) fn source(&self) -> &dyn ObjectStore {
        self.handle.config.source().as_ref()
    }

    /// The store objects are written to
    pub(crate) fn destination(&self) -> &dyn ObjectStore {
        self.handle.config.destination().as_ref()
    }
}

impl<State> Clone for TransferContext<State> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            state: self.state.clone(),
        }
    }
}
