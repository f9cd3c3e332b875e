//! Revoked-session store
//!
//! Logout revokes the token's `jti`. Revocations are persisted in the
//! `revoked_token` table so they survive process restarts, and fronted by a
//! DashMap cache so the per-request check in the auth middleware never hits
//! the database. Entries expire together with the token they revoke and are
//! purged lazily on access plus once at startup.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::utils::time::now_millis;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RevokedToken {
    jti: String,
    expires_at: i64,
}

/// Process-wide store of revoked token ids
#[derive(Debug, Clone)]
pub struct RevocationStore {
    db: Surreal<Db>,
    /// jti -> expires_at (Unix millis)
    cache: Arc<DashMap<String, i64>>,
}

impl RevocationStore {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            db,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Startup: drop expired rows, then warm the cache with the live ones
    pub async fn load(&self) -> Result<usize, AppError> {
        self.purge_expired().await?;

        let rows: Vec<RevokedToken> = self
            .db
            .query("SELECT * FROM revoked_token")
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .take(0)
            .map_err(|e| AppError::database(e.to_string()))?;

        let count = rows.len();
        for row in rows {
            self.cache.insert(row.jti, row.expires_at);
        }

        if count > 0 {
            tracing::info!(count, "Loaded revoked sessions");
        }
        Ok(count)
    }

    /// Revoke a token id until its natural expiry
    pub async fn revoke(&self, jti: &str, expires_at: i64) -> Result<(), AppError> {
        self.cache.insert(jti.to_string(), expires_at);

        let result = self
            .db
            .query("CREATE revoked_token SET jti = $jti, expires_at = $expires_at")
            .bind(("jti", jti.to_string()))
            .bind(("expires_at", expires_at))
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .check();

        // A second logout with the same token hits the unique index; the
        // session is already revoked, which is the outcome we wanted.
        if let Err(e) = result {
            let msg = e.to_string();
            if !msg.contains("revoked_jti") {
                return Err(AppError::database(msg));
            }
        }

        Ok(())
    }

    /// Check whether a token id is revoked. Expired entries fall out here.
    pub fn is_revoked(&self, jti: &str) -> bool {
        match self.cache.get(jti) {
            Some(entry) => {
                if *entry.value() > now_millis() {
                    true
                } else {
                    drop(entry);
                    self.cache.remove(jti);
                    false
                }
            }
            None => false,
        }
    }

    /// Remove expired revocations from the table and the cache
    pub async fn purge_expired(&self) -> Result<(), AppError> {
        self.db
            .query("DELETE revoked_token WHERE expires_at <= $now")
            .bind(("now", now_millis()))
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .check()
            .map_err(|e| AppError::database(e.to_string()))?;

        let now = now_millis();
        self.cache.retain(|_, expires_at| *expires_at > now);
        Ok(())
    }

    /// Number of live revocations (tests/diagnostics)
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
