//! Booking entity: a declared user/event link, unique per pair.

use eventhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateBooking {
    pub user_id: DbId,
    pub event_id: DbId,
}
