//! Revoked-session store: persistence across restarts and expiry purge.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use store_server::auth::RevocationStore;
use store_server::db;
use store_server::utils::time::now_millis;

async fn test_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.expect("open mem db");
    db.use_ns("test").use_db("test").await.expect("select ns");
    db::apply_schema(&db).await.expect("apply schema");
    db
}

#[tokio::test]
async fn revoked_token_is_rejected_until_expiry() {
    let db = test_db().await;
    let store = RevocationStore::new(db);

    let future = now_millis() + 60_000;
    store.revoke("jti-1", future).await.expect("revoke");

    assert!(store.is_revoked("jti-1"));
    assert!(!store.is_revoked("jti-2"));
}

#[tokio::test]
async fn revocations_survive_a_restart() {
    let db = test_db().await;

    let store = RevocationStore::new(db.clone());
    store
        .revoke("jti-persisted", now_millis() + 60_000)
        .await
        .expect("revoke");

    // A new store over the same database simulates a process restart
    let restarted = RevocationStore::new(db);
    assert!(!restarted.is_revoked("jti-persisted"), "cold cache");

    restarted.load().await.expect("warm cache");
    assert!(restarted.is_revoked("jti-persisted"));
}

#[tokio::test]
async fn expired_revocations_fall_out() {
    let db = test_db().await;
    let store = RevocationStore::new(db.clone());

    store
        .revoke("jti-expired", now_millis() - 1_000)
        .await
        .expect("revoke");
    store
        .revoke("jti-live", now_millis() + 60_000)
        .await
        .expect("revoke");

    // Lazy expiry on access
    assert!(!store.is_revoked("jti-expired"));
    assert!(store.is_revoked("jti-live"));

    // Startup purge drops the expired row from the table as well
    let restarted = RevocationStore::new(db);
    restarted.load().await.expect("load");
    assert_eq!(restarted.len(), 1);
    assert!(restarted.is_revoked("jti-live"));
    assert!(!restarted.is_revoked("jti-expired"));
}

#[tokio::test]
async fn double_revocation_is_idempotent() {
    let db = test_db().await;
    let store = RevocationStore::new(db);

    let exp = now_millis() + 60_000;
    store.revoke("jti-twice", exp).await.expect("first revoke");
    store.revoke("jti-twice", exp).await.expect("second revoke");

    assert!(store.is_revoked("jti-twice"));
    assert_eq!(store.len(), 1);
}
