/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::Instrument;

use super::{clamp_page_size, ListObjectsPage, ListObjectsRequest, ObjectStore, PutObjectRequest};
use crate::error::{self, ErrorKind};
use crate::types::{ObjectDescriptor, PageCursor};

/// An [`ObjectStore`] over a single bucket reached through the S3 API.
///
/// Works for any S3 compatible service (e.g. Aliyun OSS) as long as the underlying
/// client is configured with the service endpoint.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new store for `bucket` using the given client
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// The bucket this store reads from and writes to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        &self.bucket
    }

    async fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Result<ListObjectsPage, error::Error> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(clamp_page_size(request.max_keys))
            .set_continuation_token(request.cursor.token().map(str::to_owned))
            .set_prefix(request.prefix)
            .send()
            .instrument(tracing::debug_span!("send-list-objects-v2"))
            .await?;

        let has_more = output.is_truncated().unwrap_or(false);
        if has_more && output.next_continuation_token().is_none() {
            return Err(error::listing_failed(format!(
                "listing of bucket {:?} was truncated without a continuation token",
                self.bucket
            )));
        }

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?;
                let size = obj.size().unwrap_or_default().try_into().unwrap_or_default();
                Some(ObjectDescriptor::new(key, size))
            })
            .collect();

        Ok(ListObjectsPage {
            objects,
            next_cursor: PageCursor::from(output.next_continuation_token),
            has_more,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, error::Error> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-get-object"))
            .await?;

        let body = resp
            .body
            .collect()
            .instrument(tracing::debug_span!("collect-body-from-get-object"))
            .await?;

        Ok(body.into_bytes())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<(), error::Error> {
        let PutObjectRequest {
            key,
            body,
            content_type,
            policy,
        } = request;

        let content_length =
            i64::try_from(body.len()).map_err(error::from_kind(ErrorKind::InputInvalid))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(policy.acl().clone())
            .content_disposition(policy.content_disposition())
            .server_side_encryption(policy.server_side_encryption().clone())
            .storage_class(policy.storage_class().clone())
            .send()
            .instrument(tracing::debug_span!("send-put-object"))
            .await?;

        Ok(())
    }

    async fn verify(&self) -> Result<(), error::Error> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .instrument(tracing::debug_span!("send-head-bucket"))
            .await?;
        Ok(())
    }
}
