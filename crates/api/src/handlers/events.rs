//! Event handlers beyond plain CRUD: the populated detail view, the
//! caller's events, and RSVP.

use axum::extract::State;
use axum::Json;
use eventhub_core::types::{DbId, Timestamp};
use eventhub_db::models::event::Event;
use eventhub_db::repositories::EventRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::{lenient, present, IdPath};
use crate::handlers::factory::{self, Fetched};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireUser;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(length(min = 1, message = "An event must have an address"))]
    pub address: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LocationPatch {
    #[validate(length(min = 1, message = "An event must have an address"))]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub country: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "An event must have a title"))]
    pub title: String,
    pub description: Option<String>,
    pub date: Timestamp,
    #[serde(deserialize_with = "lenient::value")]
    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: i32,
    #[validate(nested)]
    pub location: LocationInput,
    #[serde(default, deserialize_with = "lenient::option")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "An event must have a title"))]
    pub title: Option<String>,
    /// `null` clears.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub date: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient::option")]
    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: Option<i32>,
    #[validate(nested)]
    pub location: Option<LocationPatch>,
    /// `null` makes the event free.
    #[serde(default, deserialize_with = "lenient::patch")]
    pub price: Option<Option<f64>>,
}

impl UpdateEventRequest {
    /// Checks the derive cannot express on a nullable patch field.
    pub fn check_price(&self) -> Result<(), AppError> {
        match self.price {
            Some(Some(price)) if price < 0.0 => Err(AppError::BadRequest(
                "Invalid input data. price must not be negative".into(),
            )),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /events/{id} -- attendees and creator resolved.
pub async fn get_event(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<DataResponse<Fetched<EventRepo>>>> {
    let event = factory::get_one::<EventRepo>(&state, id, true).await?;
    Ok(Json(DataResponse::new(event)))
}

/// GET /events/myEvents -- events the caller is attending. Empty is not an error.
pub async fn my_events(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ListResponse<Event>>> {
    let events = EventRepo::list_attended_by(&state.pool, user.user_id).await?;
    Ok(Json(ListResponse::new(events)))
}

/// PATCH /events/{id}/attend
pub async fn attend(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = rsvp_result(id, EventRepo::attend(&state.pool, id, user.user_id).await?)?;
    tracing::info!(event_id = id, user_id = user.user_id, "User attending event");
    Ok(Json(DataResponse::new(event)))
}

/// PATCH /events/{id}/unattend
pub async fn unattend(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = rsvp_result(id, EventRepo::unattend(&state.pool, id, user.user_id).await?)?;
    tracing::info!(event_id = id, user_id = user.user_id, "User no longer attending event");
    Ok(Json(DataResponse::new(event)))
}

fn rsvp_result(
    event_id: DbId,
    outcome: Result<Event, eventhub_core::rsvp::RsvpRejection>,
) -> AppResult<Event> {
    outcome.map_err(|rejection| AppError::Core(rejection.into_error(event_id)))
}
