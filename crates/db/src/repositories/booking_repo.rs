//! Repository for the `bookings` table.

use eventhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::booking::{Booking, CreateBooking};

const COLUMNS: &str = "id, user_id, event_id, created_at";

/// Provides create/list/delete for bookings. A user may book an event at
/// most once (`uq_bookings_user_event`).
pub struct BookingRepo;

impl BookingRepo {
    pub async fn create(pool: &PgPool, input: &CreateBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings (user_id, event_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(input.user_id)
            .bind(input.event_id)
            .fetch_one(pool)
            .await
    }

    /// Bookings of one user, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Booking>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Booking>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
