//! Repository for the `users` table.

use sqlx::PgPool;
use tradepost_core::types::DbId;

use crate::models::user::{CreateUser, PublicProfile, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, avatar_url, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, avatar_url)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.avatar_url)
            .fetch_one(pool)
            .await
    }

    /// Find a user by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public profile projection for a user.
    pub async fn public_profile(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PublicProfile>, sqlx::Error> {
        sqlx::query_as::<_, PublicProfile>(
            "SELECT id, name, avatar_url FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
