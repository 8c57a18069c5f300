/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
use bucket_migrator::error::ErrorKind;
use bucket_migrator::store::in_memory::InMemoryStore;
use bucket_migrator::types::{ConcurrencySetting, FailedTransferPolicy, UploadPolicy};
use test_common::{client_for, object_key, random_bytes, seeded_store, Failures};

fn three_objects_on_two_pages() -> InMemoryStore {
    InMemoryStore::new("source")
        .with_object("k1", random_bytes(10))
        .with_object("k2", random_bytes(2048))
        .with_object("k3", random_bytes(0))
        .with_max_page_size(2)
}

fn assert_same_contents(source: &InMemoryStore, destination: &InMemoryStore) {
    for key in source.keys() {
        assert_eq!(
            source.object(&key),
            destination.object(&key),
            "contents differ for {key}"
        );
    }
}

#[tokio::test]
async fn test_migrate_all_objects_across_pages() {
    let source = Arc::new(three_objects_on_two_pages());
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.objects_listed());
    assert_eq!(3, output.objects_copied());
    assert_eq!(0, output.objects_failed());
    assert_eq!(2058, output.total_bytes_transferred());
    assert!(output.failed_transfers().is_empty());
    assert!(!output.cancelled());
    assert_eq!(2, source.list_calls());
    assert_eq!(vec!["k1", "k2", "k3"], destination.keys());
    assert_same_contents(&source, &destination);

    assert_eq!(3, client.metrics().objects_listed());
    assert_eq!(3, client.metrics().transfers_completed());
    assert_eq!(0, client.metrics().retries());
}

#[tokio::test]
async fn test_failed_object_does_not_stop_the_run() {
    let (_guard, rx) = capture_test_logs();

    let source = Arc::new(three_objects_on_two_pages());
    let destination = Arc::new(InMemoryStore::new("destination").fail_put("k2", Failures::Always));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.objects_copied());
    assert_eq!(1, output.objects_failed());
    assert_eq!(
        output.objects_listed(),
        output.objects_copied() + output.objects_failed()
    );

    let failed = output.failed_transfers();
    assert_eq!(1, failed.len());
    assert_eq!("k2", failed[0].key());
    assert_eq!(3, failed[0].attempts());
    // no attempt beyond the configured maximum
    assert_eq!(3, destination.put_calls("k2"));

    assert_eq!(vec!["k1", "k3"], destination.keys());
    assert_eq!(source.object("k1"), destination.object("k1"));
    assert_eq!(source.object("k3"), destination.object("k3"));

    assert!(rx
        .contents()
        .contains("failed to copy \"k2\" (2.00KB) after 3 attempt(s) in "));
}

#[tokio::test]
async fn test_empty_final_page() {
    let source = Arc::new(
        InMemoryStore::new("source")
            .with_object("k1", "a")
            .with_object("k2", "b")
            .with_max_page_size(2)
            .with_empty_final_page(),
    );
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.objects_listed());
    assert_eq!(2, output.objects_copied());
    assert_eq!(2, source.list_calls());
    // every object is transferred exactly once
    assert_eq!(1, destination.put_calls("k1"));
    assert_eq!(1, destination.put_calls("k2"));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let source = Arc::new(
        three_objects_on_two_pages().fail_get("k1", Failures::Times(1)),
    );
    let destination =
        Arc::new(InMemoryStore::new("destination").fail_put("k3", Failures::Times(2)));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.objects_copied());
    assert_eq!(0, output.objects_failed());
    assert_eq!(2, source.get_calls("k1"));
    assert_eq!(3, source.get_calls("k3"));
    assert_eq!(3, client.metrics().retries());
    assert_same_contents(&source, &destination);
}

#[tokio::test]
async fn test_many_objects_with_concurrency() {
    let source = Arc::new(seeded_store("source", 57).with_max_page_size(10));
    let destination = Arc::new(
        InMemoryStore::new("destination")
            .fail_put(object_key(13), Failures::Always)
            .fail_put(object_key(42), Failures::Always),
    );
    let client = client_for(
        source.clone(),
        destination.clone(),
        ConcurrencySetting::Explicit(4),
    );

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(57, output.objects_listed());
    assert_eq!(55, output.objects_copied());
    assert_eq!(2, output.objects_failed());
    assert_eq!(6, source.list_calls());

    let mut failed_keys: Vec<_> = output.failed_transfers().iter().map(|f| f.key()).collect();
    failed_keys.sort();
    assert_eq!(vec![object_key(13), object_key(42)], failed_keys);
}

#[tokio::test]
async fn test_sequential_migration_follows_listing_order() {
    let source = Arc::new(seeded_store("source", 5).with_max_page_size(2));
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(
        source.clone(),
        destination.clone(),
        ConcurrencySetting::Explicit(1),
    );

    let output = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(5, output.objects_copied());
    assert_eq!(source.keys(), destination.keys());
    assert_same_contents(&source, &destination);
}

#[tokio::test]
async fn test_abort_policy_returns_first_failure() {
    let source = Arc::new(seeded_store("source", 20));
    let destination =
        Arc::new(InMemoryStore::new("destination").fail_put(object_key(0), Failures::Always));
    let client = client_for(
        source.clone(),
        destination.clone(),
        ConcurrencySetting::Explicit(1),
    );

    let err = client
        .migrate_objects()
        .failure_policy(FailedTransferPolicy::Abort)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::TransferFailed(_)));
    assert!(destination.keys().len() < 20);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let source = Arc::new(three_objects_on_two_pages().fail_list_call(2));
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let err = client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::ListingFailed, err.kind());
    assert!(destination.put_calls("k3") == 0);
}

#[tokio::test]
async fn test_cancel_before_work_starts() {
    let source = Arc::new(seeded_store("source", 10));
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let handle = client.migrate_objects().send().await.unwrap();
    let canceller = handle.canceller();
    canceller.cancel();
    assert!(canceller.is_cancelled());

    let output = handle.join().await.unwrap();

    assert!(output.cancelled());
    assert_eq!(0, output.objects_copied());
    assert_eq!(0, output.objects_failed());
    assert_eq!(output.objects_listed(), output.objects_skipped());
    assert!(destination.keys().is_empty());
}

#[tokio::test]
async fn test_abort_handle() {
    let source = Arc::new(seeded_store("source", 10));
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let mut handle = client.migrate_objects().send().await.unwrap();
    handle.abort().await.unwrap();

    assert!(destination.keys().is_empty());
}

#[tokio::test]
async fn test_dry_run_transfers_nothing() {
    let source = Arc::new(three_objects_on_two_pages());
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .dry_run(true)
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.objects_listed());
    assert_eq!(2058, output.total_bytes_listed());
    assert_eq!(0, output.objects_copied());
    assert!(destination.keys().is_empty());
    assert_eq!(0, source.get_calls("k1"));
}

#[tokio::test]
async fn test_key_prefix() {
    let source = Arc::new(
        InMemoryStore::new("source")
            .with_object("2023/a", "a")
            .with_object("2024/b", "b")
            .with_object("2024/c", "c"),
    );
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    let output = client
        .migrate_objects()
        .key_prefix("2024/")
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(2, output.objects_copied());
    assert_eq!(vec!["2024/b", "2024/c"], destination.keys());
}

#[tokio::test]
async fn test_upload_metadata() {
    let source = Arc::new(
        InMemoryStore::new("source")
            .with_object("logo.png", &b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR"[..])
            .with_object("notes.txt", "plain text notes"),
    );
    let destination = Arc::new(InMemoryStore::new("destination"));
    let client = client_for(source.clone(), destination.clone(), ConcurrencySetting::Auto);

    client
        .migrate_objects()
        .send()
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    let png = destination.stored_object("logo.png").unwrap();
    assert_eq!(Some("image/png"), png.content_type.as_deref());
    assert_eq!(Some(UploadPolicy::default()), png.policy);

    let txt = destination.stored_object("notes.txt").unwrap();
    assert_eq!(
        Some("text/plain; charset=utf-8"),
        txt.content_type.as_deref()
    );
}
