//! Repository for the `users` table.

use eventhub_core::listing::ResolvedQuery;
use eventhub_core::photo::DEFAULT_PHOTO;
use eventhub_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::listing::fetch_page;
use crate::models::user::{CreateUser, UpdateUser, User, UserSummary};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, photo, role, password_changed_at, \
                       password_reset_token, password_reset_expires, active, created_at, updated_at";

/// Provides CRUD and credential operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role, photo)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(input.photo.as_deref().unwrap_or(DEFAULT_PHOTO))
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Emails are stored lowercased, so callers
    /// normalize before looking up.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Public fields of one user.
    pub async fn find_summary(pool: &PgPool, id: DbId) -> Result<Option<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>("SELECT id, name, email, photo FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered, sorted, paged listing.
    pub async fn list(pool: &PgPool, query: &ResolvedQuery) -> Result<Vec<User>, sqlx::Error> {
        fetch_page(pool, &format!("SELECT {COLUMNS} FROM users"), query).await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                active = COALESCE($5, active),
                photo = COALESCE($6, photo)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .bind(input.active)
            .bind(&input.photo)
            .fetch_optional(pool)
            .await
    }

    /// Replace the password hash, stamp `password_changed_at` and drop any
    /// pending reset token.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                password_hash = $2,
                password_changed_at = NOW(),
                password_reset_token = NULL,
                password_reset_expires = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Store the hash of a freshly issued reset token.
    pub async fn set_reset_token(
        pool: &PgPool,
        id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set a new password for the active user holding an unexpired reset
    /// token. The token is cleared in the same statement, so it can be
    /// used once.
    ///
    /// Returns `None` if no user matches.
    pub async fn consume_reset_token(
        pool: &PgPool,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                password_hash = $2,
                password_changed_at = NOW(),
                password_reset_token = NULL,
                password_reset_expires = NULL
             WHERE password_reset_token = $1
               AND password_reset_expires > NOW()
               AND active = true
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .bind(password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a user by setting `active = false`.
    ///
    /// Returns `true` if the row exists.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET active = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a user, returning the removed row.
    ///
    /// Runs in one transaction. The user row is locked first, so an attend
    /// racing the delete waits on its foreign-key check and then fails. Slots
    /// are released only for attendee rows this transaction actually removed,
    /// so a concurrent unattend cannot decrement the same slot twice.
    /// Fails with a foreign-key violation while the user still owns events,
    /// leaving attendee rows untouched.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked =
            sqlx::query_scalar::<_, DbId>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let released = sqlx::query(
            "WITH removed AS (
                DELETE FROM event_attendees WHERE user_id = $1
                RETURNING event_id
             )
             UPDATE events e SET attendee_count = e.attendee_count - 1
             FROM removed r
             WHERE e.id = r.event_id",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let query = format!("DELETE FROM users WHERE id = $1 RETURNING {COLUMNS}");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = id, released, "User deleted");
        Ok(user)
    }
}
