//! Event entity model and DTOs.

use eventhub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::UserSummary;

/// Where an event takes place. Stored as `location_*` columns, exposed as
/// a nested object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Location {
    #[sqlx(rename = "location_address")]
    pub address: String,
    #[sqlx(rename = "location_city")]
    pub city: Option<String>,
    #[sqlx(rename = "location_country")]
    pub country: Option<String>,
}

/// A row from the `events` table with its attendee ids.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub max_participants: i32,
    pub attendee_count: i32,
    #[sqlx(flatten)]
    pub location: Location,
    pub photo: String,
    /// `None` means free entry.
    pub price: Option<f64>,
    /// User ids in RSVP order.
    pub attendees: Vec<DbId>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An event with its attendee and creator references resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub max_participants: i32,
    pub attendee_count: i32,
    pub location: Location,
    pub photo: String,
    pub price: Option<f64>,
    pub attendees: Vec<UserSummary>,
    /// `None` only if the creator row vanished between the two reads.
    pub created_by: Option<UserSummary>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EventDetail {
    pub fn new(event: Event, attendees: Vec<UserSummary>, creator: Option<UserSummary>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            max_participants: event.max_participants,
            attendee_count: event.attendee_count,
            location: event.location,
            photo: event.photo,
            price: event.price,
            attendees,
            created_by: creator,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// DTO for creating a new event.
#[derive(Debug)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub max_participants: i32,
    pub location: Location,
    pub photo: Option<String>,
    pub price: Option<f64>,
    pub created_by: DbId,
}

/// DTO for updating an event. `None` keeps the column.
///
/// Nullable columns use `Option<Option<T>>`: `Some(None)` clears them.
#[derive(Debug, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<Timestamp>,
    pub max_participants: Option<i32>,
    pub location_address: Option<String>,
    pub location_city: Option<Option<String>>,
    pub location_country: Option<Option<String>>,
    pub photo: Option<String>,
    pub price: Option<Option<f64>>,
}
