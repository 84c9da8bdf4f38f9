use anonflux_bucket::{BlobStore, BucketError, MemoryBlobStore};
use bytes::Bytes;

#[tokio::test]
async fn put_before_ensure_bucket_is_rejected() {
    let store = MemoryBlobStore::new();

    let err = store
        .put_object("users", "a.enc", Bytes::from_static(b"x"), "application/octet-stream")
        .await
        .expect_err("bucket does not exist yet");

    assert!(matches!(err, BucketError::BucketNotFound(name) if name == "users"));
    assert!(!store.bucket_exists("users"));
}

#[tokio::test]
async fn ensure_bucket_is_idempotent_and_keeps_objects() {
    let store = MemoryBlobStore::new();
    store.ensure_bucket("users").await.unwrap();
    store
        .put_object("users", "a.enc", Bytes::from_static(b"payload"), "application/octet-stream")
        .await
        .unwrap();

    store.ensure_bucket("users").await.unwrap();

    assert_eq!(store.object_count("users"), 1);
    let fetched = store.get_object("users", "a.enc").await.unwrap();
    assert_eq!(fetched.as_ref(), b"payload");
}

#[tokio::test]
async fn missing_object_reports_not_found() {
    let store = MemoryBlobStore::new();
    store.ensure_bucket("users").await.unwrap();

    let err = store.get_object("users", "absent.enc").await.unwrap_err();
    assert!(matches!(err, BucketError::NotFound { ref key, .. } if key == "absent.enc"));
}
