/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::FailedTransferPolicy;
use aws_smithy_types::error::operation::BuildError;

/// Longest key prefix accepted, matching the maximum object key length
const MAX_KEY_PREFIX_LEN: usize = 1024;

/// Input type for migrating objects between stores
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct MigrateObjectsInput {
    /// Limit the migration to keys that begin with the given prefix
    pub key_prefix: Option<String>,

    /// The failure policy to use when any individual object fails to migrate.
    pub failure_policy: FailedTransferPolicy,

    /// List the source without transferring anything
    pub dry_run: bool,
}

impl MigrateObjectsInput {
    /// Creates a new builder-style object to manufacture [`MigrateObjectsInput`](crate::operation::migrate_objects::MigrateObjectsInput).
    pub fn builder() -> MigrateObjectsInputBuilder {
        MigrateObjectsInputBuilder::default()
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// The failure policy to use when any individual object fails to migrate.
    pub fn failure_policy(&self) -> &FailedTransferPolicy {
        &self.failure_policy
    }

    /// List the source without transferring anything
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// A builder for [`MigrateObjectsInput`](crate::operation::migrate_objects::MigrateObjectsInput).
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct MigrateObjectsInputBuilder {
    pub(crate) key_prefix: Option<String>,
    pub(crate) failure_policy: FailedTransferPolicy,
    pub(crate) dry_run: bool,
}

impl MigrateObjectsInputBuilder {
    /// Limit the migration to keys that begin with the given prefix
    pub fn key_prefix(mut self, input: impl Into<String>) -> Self {
        self.key_prefix = Some(input.into());
        self
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn set_key_prefix(mut self, input: Option<String>) -> Self {
        self.key_prefix = input;
        self
    }

    /// Limit the migration to keys that begin with the given prefix
    pub fn get_key_prefix(&self) -> &Option<String> {
        &self.key_prefix
    }

    /// The failure policy to use when any individual object fails to migrate.
    pub fn failure_policy(mut self, input: FailedTransferPolicy) -> Self {
        self.failure_policy = input;
        self
    }

    /// The failure policy to use when any individual object fails to migrate.
    pub fn get_failure_policy(&self) -> &FailedTransferPolicy {
        &self.failure_policy
    }

    /// List the source and report what would be migrated without transferring anything
    pub fn dry_run(mut self, input: bool) -> Self {
        self.dry_run = input;
        self
    }

    /// List the source and report what would be migrated without transferring anything
    pub fn get_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Consumes the builder and constructs a [`MigrateObjectsInput`](crate::operation::migrate_objects::MigrateObjectsInput).
    pub fn build(self) -> Result<MigrateObjectsInput, BuildError> {
        // an empty prefix lists everything
        let key_prefix = self.key_prefix.filter(|prefix| !prefix.is_empty());

        if key_prefix
            .as_ref()
            .is_some_and(|prefix| prefix.len() > MAX_KEY_PREFIX_LEN)
        {
            return Err(BuildError::invalid_field(
                "key_prefix",
                format!("key prefix must not be longer than {MAX_KEY_PREFIX_LEN} bytes"),
            ));
        }

        Ok(MigrateObjectsInput {
            key_prefix,
            failure_policy: self.failure_policy,
            dry_run: self.dry_run,
        })
    }
}
