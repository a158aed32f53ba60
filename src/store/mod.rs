/// Principal persistence
///
/// The auth flows only talk to `PrincipalStore`. Postgres backs it in
/// production; the in-memory store backs tests and local runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::InMemoryPrincipalStore;
pub use postgres::PgPrincipalStore;

/// An account that can log in
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Fingerprint of the current refresh token, if any
    pub refresh_token_hash: Option<String>,
    pub confirmed: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            refresh_token_hash: None,
            confirmed: false,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, AppError>;

    async fn find_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, AppError>;

    /// Insert or fully update a principal. Fails with a unique constraint
    /// violation when another principal already owns the email.
    async fn save(&self, principal: &Principal) -> Result<(), AppError>;

    /// Update `confirmed` and `avatar_url` only. Credentials and the stored
    /// refresh token are left as they are, so a stale copy cannot undo a
    /// rotation that happened meanwhile.
    async fn save_profile(&self, principal: &Principal) -> Result<(), AppError>;

    /// Overwrite the stored refresh token fingerprint and nothing else.
    /// Fails with `NotFound` when the principal does not exist.
    async fn set_refresh_token(&self, id: Uuid, fingerprint: Option<&str>) -> Result<(), AppError>;

    /// Atomically replace the stored refresh token fingerprint, but only if
    /// it still equals `expected`. Returns whether the swap happened.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: Option<&str>,
    ) -> Result<bool, AppError>;
}
