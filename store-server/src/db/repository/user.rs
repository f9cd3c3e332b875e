//! User Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::{AuthProvider, SocialUserCreate, User, UserCreate, UserRole, UserUpdate};
use crate::utils::time::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let rid = parse_record_id(USER_TABLE, id)?;
        let user: Option<User> = self.base.db().select(rid).await?;
        Ok(user)
    }

    /// Find user by exact username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let username = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by login identifier: username, email or phone
    pub async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<User>> {
        let identifier = identifier.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE username = $i OR email = $i OR phone = $i LIMIT 1",
            )
            .bind(("i", identifier))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find social account by provider identity
    pub async fn find_by_provider(
        &self,
        provider: AuthProvider,
        provider_id: &str,
    ) -> RepoResult<Option<User>> {
        let provider_id = provider_id.to_string();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE provider = $provider AND provider_id = $pid LIMIT 1",
            )
            .bind(("provider", provider))
            .bind(("pid", provider_id))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// True if the email is already taken
    pub async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let email = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM user WHERE email = $email GROUP ALL")
            .bind(("email", email))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count > 0).unwrap_or(false))
    }

    /// True if the phone number is already taken
    pub async fn phone_exists(&self, phone: &str) -> RepoResult<bool> {
        let phone = phone.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM user WHERE phone = $phone GROUP ALL")
            .bind(("phone", phone))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.count > 0).unwrap_or(false))
    }

    /// Create a local account. The password hash is persisted through an
    /// explicit SET binding; the model itself never serializes it.
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let hash_pass = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let role = data.role.unwrap_or(UserRole::Customer);

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    name = $name,
                    username = $username,
                    email = $email,
                    phone = $phone,
                    hash_pass = $hash_pass,
                    role = $role,
                    provider = 'local',
                    provider_id = NONE,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("username", data.username))
            .bind(("email", data.email))
            .bind(("phone", data.phone))
            .bind(("hash_pass", hash_pass))
            .bind(("role", role))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Upsert a social account by (provider, provider_id)
    pub async fn upsert_social(&self, data: SocialUserCreate) -> RepoResult<User> {
        if let Some(existing) = self
            .find_by_provider(data.provider, &data.provider_id)
            .await?
        {
            return Ok(existing);
        }

        // Social usernames are synthesized and must not collide with local ones
        let username = format!(
            "{}_{}",
            match data.provider {
                AuthProvider::Google => "gg",
                AuthProvider::Facebook => "fb",
                AuthProvider::Local => "local",
            },
            data.provider_id
        );

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    name = $name,
                    username = $username,
                    email = $email,
                    phone = NONE,
                    hash_pass = NONE,
                    role = 'customer',
                    provider = $provider,
                    provider_id = $provider_id,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("username", username))
            .bind(("email", data.email))
            .bind(("provider", data.provider))
            .bind(("provider_id", data.provider_id))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create social user".to_string()))
    }

    /// List users, newest first (admin back-office)
    pub async fn find_page(&self, page: i64, limit: i64) -> RepoResult<(Vec<User>, i64)> {
        let start = (page.max(1) - 1) * limit;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY created_at DESC LIMIT $limit START $start")
            .query("SELECT count() AS count FROM user GROUP ALL")
            .bind(("limit", limit))
            .bind(("start", start))
            .await?;
        let users: Vec<User> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        Ok((users, counts.first().map(|c| c.count).unwrap_or(0)))
    }

    /// Update name / role / active flag (admin back-office)
    pub async fn update(&self, id: &str, data: UserUpdate) -> RepoResult<User> {
        let rid = parse_record_id(USER_TABLE, id)?;

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.role.is_some() {
            set_parts.push("role = $role");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)));
        }

        let sql = format!("UPDATE $id SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(sql).bind(("id", rid));
        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.role {
            query = query.bind(("role", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let mut result = query.await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }
}
