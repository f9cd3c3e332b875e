//! Database bootstrap against a real on-disk engine.

use store_server::db;

#[tokio::test]
async fn init_creates_database_and_schema_idempotently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work_dir = dir.path().to_str().expect("utf8 path");

    let handle = db::init(work_dir).await.expect("first init");

    // Schema application is idempotent
    db::apply_schema(&handle).await.expect("re-apply schema");

    // The data directory was created under the work dir
    assert!(dir.path().join("data").exists());
}
