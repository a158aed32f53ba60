use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Principal, PrincipalStore};
use crate::error::{AppError, DatabaseError};

/// Principal store backed by the `users` table
#[derive(Clone)]
pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, confirmed, avatar_url, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    async fn find_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, AppError> {
        let principal = sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, email, password_hash, refresh_token_hash, confirmed, avatar_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    async fn save(&self, principal: &Principal) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, refresh_token_hash, confirmed, avatar_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                refresh_token_hash = EXCLUDED.refresh_token_hash,
                confirmed = EXCLUDED.confirmed,
                avatar_url = EXCLUDED.avatar_url
            "#,
        )
        .bind(principal.id)
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.refresh_token_hash)
        .bind(principal.confirmed)
        .bind(&principal.avatar_url)
        .bind(principal.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_profile(&self, principal: &Principal) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET confirmed = $1, avatar_url = $2
            WHERE id = $3
            "#,
        )
        .bind(principal.confirmed)
        .bind(&principal.avatar_url)
        .bind(principal.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()).into());
        }
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, fingerprint: Option<&str>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $1 WHERE id = $2")
            .bind(fingerprint)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()).into());
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: Option<&str>,
    ) -> Result<bool, AppError> {
        // Single conditional UPDATE; Postgres row locking serialises racing swaps
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $1
            WHERE id = $2 AND refresh_token_hash = $3
            "#,
        )
        .bind(new)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
