//! Repository for the `events` table and its attendee list.

use eventhub_core::listing::ResolvedQuery;
use eventhub_core::photo::DEFAULT_PHOTO;
use eventhub_core::rsvp::{classify_attend, classify_unattend, AttendeeSnapshot, RsvpRejection};
use eventhub_core::types::DbId;
use sqlx::PgPool;

use crate::listing::fetch_page;
use crate::models::event::{CreateEvent, Event, UpdateEvent};
use crate::models::user::UserSummary;
use crate::repositories::{has_sqlstate, UNIQUE_VIOLATION};

/// Column list shared across queries. `attendees` is aggregated from
/// `event_attendees` in RSVP order.
const COLUMNS: &str = "id, title, description, date, max_participants, attendee_count, \
                       location_address, location_city, location_country, photo, price, \
                       ARRAY(SELECT a.user_id FROM event_attendees a \
                             WHERE a.event_id = events.id \
                             ORDER BY a.created_at, a.user_id) AS attendees, \
                       created_by, created_at, updated_at";

/// Claim a slot and record the attendee in one statement. Yields no row
/// when the event is missing, full, or already lists the user.
const ATTEND_SQL: &str = "WITH claimed AS (
        UPDATE events SET attendee_count = attendee_count + 1
        WHERE id = $1
          AND attendee_count < max_participants
          AND NOT EXISTS (
              SELECT 1 FROM event_attendees WHERE event_id = $1 AND user_id = $2
          )
        RETURNING id
     )
     INSERT INTO event_attendees (event_id, user_id)
     SELECT id, $2 FROM claimed
     RETURNING event_id";

/// Remove the attendee and release the slot in one statement.
const UNATTEND_SQL: &str = "WITH removed AS (
        DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2
        RETURNING event_id
     )
     UPDATE events SET attendee_count = attendee_count - 1
     WHERE id IN (SELECT event_id FROM removed)
     RETURNING id";

/// Provides CRUD and RSVP operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (title, description, date, max_participants,
                                 location_address, location_city, location_country,
                                 photo, price, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.date)
            .bind(input.max_participants)
            .bind(&input.location.address)
            .bind(&input.location.city)
            .bind(&input.location.country)
            .bind(input.photo.as_deref().unwrap_or(DEFAULT_PHOTO))
            .bind(input.price)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public fields of every attendee, in RSVP order.
    pub async fn list_attendees(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.email, u.photo
             FROM event_attendees a
             JOIN users u ON u.id = a.user_id
             WHERE a.event_id = $1
             ORDER BY a.created_at, a.user_id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Filtered, sorted, paged listing.
    pub async fn list(pool: &PgPool, query: &ResolvedQuery) -> Result<Vec<Event>, sqlx::Error> {
        fetch_page(pool, &format!("SELECT {COLUMNS} FROM events"), query).await
    }

    /// Events the user is attending, soonest first.
    pub async fn list_attended_by(pool: &PgPool, user_id: DbId) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE id IN (SELECT event_id FROM event_attendees WHERE user_id = $1)
             ORDER BY date ASC, id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update an event. Outer `None`s keep the stored value; `Some(None)`
    /// on a nullable column writes NULL.
    ///
    /// Returns `None` if the event does not exist or if the new
    /// `max_participants` would fall below the current attendee count;
    /// use [`EventRepo::exists`] to tell the two apart.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                date = COALESCE($5, date),
                max_participants = COALESCE($6, max_participants),
                location_address = COALESCE($7, location_address),
                location_city = CASE WHEN $8 THEN $9 ELSE location_city END,
                location_country = CASE WHEN $10 THEN $11 ELSE location_country END,
                photo = COALESCE($12, photo),
                price = CASE WHEN $13 THEN $14 ELSE price END
             WHERE id = $1 AND COALESCE($6, max_participants) >= attendee_count
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.description.is_some())
            .bind(input.description.as_ref().and_then(|d| d.as_deref()))
            .bind(input.date)
            .bind(input.max_participants)
            .bind(&input.location_address)
            .bind(input.location_city.is_some())
            .bind(input.location_city.as_ref().and_then(|c| c.as_deref()))
            .bind(input.location_country.is_some())
            .bind(input.location_country.as_ref().and_then(|c| c.as_deref()))
            .bind(&input.photo)
            .bind(input.price.is_some())
            .bind(input.price.flatten())
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Delete an event, returning the removed row. Attendee rows cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("DELETE FROM events WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // RSVP
    // -----------------------------------------------------------------------

    /// Add `user_id` to the attendee list if the event has room.
    ///
    /// The outer `Result` carries database failures; the inner one the
    /// reason a well-formed request was refused.
    pub async fn attend(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Result<Event, RsvpRejection>, sqlx::Error> {
        let claimed = sqlx::query_scalar::<_, DbId>(ATTEND_SQL)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await;

        match claimed {
            Ok(Some(_)) => {}
            Ok(None) => {
                let snapshot = Self::snapshot(pool, event_id, user_id).await?;
                return Ok(Err(classify_attend(snapshot)));
            }
            // A concurrent attend by the same user won the insert.
            Err(e) if has_sqlstate(&e, UNIQUE_VIOLATION) => {
                return Ok(Err(RsvpRejection::AlreadyAttending));
            }
            Err(e) => return Err(e),
        }

        tracing::debug!(event_id, user_id, "Attendee added");
        Self::find_by_id(pool, event_id)
            .await?
            .map(Ok)
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Remove `user_id` from the attendee list.
    pub async fn unattend(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Result<Event, RsvpRejection>, sqlx::Error> {
        let released = sqlx::query_scalar::<_, DbId>(UNATTEND_SQL)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        if released.is_none() {
            let snapshot = Self::snapshot(pool, event_id, user_id).await?;
            return Ok(Err(classify_unattend(snapshot)));
        }

        tracing::debug!(event_id, user_id, "Attendee removed");
        Self::find_by_id(pool, event_id)
            .await?
            .map(Ok)
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Current capacity state of an event as seen by one user.
    pub async fn snapshot(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Option<AttendeeSnapshot>, sqlx::Error> {
        let row = sqlx::query_as::<_, (i32, i32, bool)>(
            "SELECT attendee_count, max_participants,
                    EXISTS(SELECT 1 FROM event_attendees WHERE event_id = $1 AND user_id = $2)
             FROM events WHERE id = $1",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(
            |(attendee_count, max_participants, is_attending)| AttendeeSnapshot {
                attendee_count,
                max_participants,
                is_attending,
            },
        ))
    }
}
