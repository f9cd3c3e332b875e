//! Server state — shared handles for every request
//!
//! [`ServerState`] holds the embedded database plus the auth services.
//! Cloning is cheap: everything inside is either `Clone`-by-handle or `Arc`.

use std::sync::Arc;

use shared::error::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::{JwtService, RevocationStore};
use crate::core::Config;
use crate::db;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT token service
    pub jwt_service: Arc<JwtService>,
    /// Revoked-session store (persistent blacklist)
    pub revoked_tokens: RevocationStore,
}

impl ServerState {
    /// Open the database, warm the revocation cache and wire the services
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = db::init(&config.work_dir).await?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let revoked_tokens = RevocationStore::new(db.clone());
        revoked_tokens.load().await?;

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            revoked_tokens,
        })
    }

    /// Build a state around an existing database handle (tests)
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let revoked_tokens = RevocationStore::new(db.clone());
        Self {
            config,
            db,
            jwt_service,
            revoked_tokens,
        }
    }
}
