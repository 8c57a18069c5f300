/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::error;
use crate::types::FailedTransferPolicy;

use super::{MigrateObjectsHandle, MigrateObjectsInputBuilder};

/// Fluent builder for constructing a migration of every object in the source store
#[derive(Debug)]
pub struct MigrateObjectsFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: MigrateObjectsInputBuilder,
}

impl MigrateObjectsFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Start the migration.
    ///
    /// Returns once listing and the worker pool have been started. Call
    /// [`join`](MigrateObjectsHandle::join) on the returned handle to wait for completion.
    pub async fn send(self) -> Result<MigrateObjectsHandle, error::Error> {
        let input = self.inner.build().map_err(error::invalid_input)?;
        crate::operation::migrate_objects::MigrateObjects::orchestrate(self.handle, input).await
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key_prefix(input);
        self
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key_prefix(input);
        self
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn get_key_prefix(&self) -> &Option<String> {
        self.inner.get_key_prefix()
    }

    /// The failure policy to use when any individual object fails to migrate.
    pub fn failure_policy(mut self, input: FailedTransferPolicy) -> Self {
        self.inner = self.inner.failure_policy(input);
        self
    }

    /// The failure policy to use when any individual object fails to migrate.
    pub fn get_failure_policy(&self) -> &FailedTransferPolicy {
        self.inner.get_failure_policy()
    }

    /// List the source and report what would be migrated without transferring anything
    pub fn dry_run(mut self, input: bool) -> Self {
        self.inner = self.inner.dry_run(input);
        self
    }

    /// List the source and report what would be migrated without transferring anything
    pub fn get_dry_run(&self) -> bool {
        self.inner.get_dry_run()
    }
}

impl crate::operation::migrate_objects::input::MigrateObjectsInputBuilder {
    /// Initiate a migration with this input using the given client.
    pub async fn send_with(
        self,
        client: &crate::Client,
    ) -> Result<MigrateObjectsHandle, error::Error> {
        let mut fluent_builder = client.migrate_objects();
        fluent_builder.inner = self;
        fluent_builder.send().await
    }
}
