//! The [`Resource`] trait: what the generic CRUD factory needs to know about
//! an entity.
//!
//! Implemented for [`UserRepo`] and [`EventRepo`]. The factory in
//! [`crate::handlers::factory`] is written once against this trait.

use async_trait::async_trait;
use eventhub_core::error::CoreError;
use eventhub_core::listing::{FieldKind, FieldSpec, ResolvedQuery};
use eventhub_core::photo::{PhotoPolicy, EVENT_PHOTOS, USER_PHOTOS};
use eventhub_core::roles::{validate_role, ROLE_USER};
use eventhub_core::types::DbId;
use eventhub_core::validation::{normalize_email, require_non_blank, validate_new_password};
use eventhub_db::models::event::{CreateEvent, Event, EventDetail, Location, UpdateEvent};
use eventhub_db::models::user::{CreateUser, UpdateUser, UserResponse};
use eventhub_db::repositories::{EventRepo, UserRepo};
use eventhub_db::DbPool;
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::handlers::events::{CreateEventRequest, UpdateEventRequest};
use crate::handlers::users::{CreateUserRequest, UpdateUserRequest};

/// An entity served by the generic CRUD handlers.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Serialized form of one record.
    type Record: Serialize + Send + Sync;
    /// Serialized form with references resolved.
    type Detail: Serialize + Send;
    type Create: DeserializeOwned + Validate + Send;
    type Update: DeserializeOwned + Validate + Send;

    /// Display name used in not-found messages.
    const NAME: &'static str;
    /// Columns available to filters and sorting on list requests.
    const FIELDS: &'static [FieldSpec];
    /// Upload rules, or `None` if the resource has no photo.
    const PHOTOS: Option<PhotoPolicy>;
    /// Whether the authenticated caller is recorded as the creator.
    const STAMPS_CREATOR: bool;

    /// Adjust raw list parameters before they are parsed.
    fn rewrite_params(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
        pairs
    }

    /// Stored photo name of a record.
    fn photo_of(record: &Self::Record) -> &str;

    async fn find_one(pool: &DbPool, id: DbId) -> Result<Option<Self::Record>, AppError>;

    async fn find_populated(pool: &DbPool, id: DbId) -> Result<Option<Self::Detail>, AppError>;

    async fn find_many(pool: &DbPool, query: &ResolvedQuery)
        -> Result<Vec<Self::Record>, AppError>;

    async fn create_one(
        pool: &DbPool,
        input: Self::Create,
        photo: Option<String>,
        creator: Option<DbId>,
    ) -> Result<Self::Record, AppError>;

    /// Returns `None` if no record with `id` exists.
    async fn update_one(
        pool: &DbPool,
        id: DbId,
        input: Self::Update,
        photo: Option<String>,
    ) -> Result<Option<Self::Record>, AppError>;

    /// Permanently remove a record, returning it.
    async fn delete_one(pool: &DbPool, id: DbId) -> Result<Option<Self::Record>, AppError>;

    /// Mark a record inactive. Returns `false` if it does not exist.
    async fn soft_delete_one(_pool: &DbPool, _id: DbId) -> Result<bool, AppError> {
        Err(AppError::BadRequest(format!(
            "{} records cannot be deactivated",
            Self::NAME
        )))
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Integer),
    FieldSpec::new("name", FieldKind::Text),
    FieldSpec::new("email", FieldKind::Text),
    FieldSpec::new("role", FieldKind::Text),
    FieldSpec::new("active", FieldKind::Boolean),
    FieldSpec::new("created_at", FieldKind::Timestamp),
    FieldSpec::new("updated_at", FieldKind::Timestamp),
];

/// `status=active|inactive` is an alias for the `active` flag; any other
/// `status` value is dropped so the listing is unfiltered.
fn rewrite_user_status(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            if key != "status" {
                return Some((key, value));
            }
            match value.as_str() {
                "active" => Some(("active".to_string(), "true".to_string())),
                "inactive" => Some(("active".to_string(), "false".to_string())),
                _ => None,
            }
        })
        .collect()
}

#[async_trait]
impl Resource for UserRepo {
    type Record = UserResponse;
    type Detail = UserResponse;
    type Create = CreateUserRequest;
    type Update = UpdateUserRequest;

    const NAME: &'static str = "User";
    const FIELDS: &'static [FieldSpec] = USER_FIELDS;
    const PHOTOS: Option<PhotoPolicy> = Some(USER_PHOTOS);
    const STAMPS_CREATOR: bool = false;

    fn rewrite_params(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
        rewrite_user_status(pairs)
    }

    fn photo_of(record: &UserResponse) -> &str {
        &record.photo
    }

    async fn find_one(pool: &DbPool, id: DbId) -> Result<Option<UserResponse>, AppError> {
        Ok(UserRepo::find_by_id(pool, id).await?.map(UserResponse::from))
    }

    async fn find_populated(pool: &DbPool, id: DbId) -> Result<Option<UserResponse>, AppError> {
        Self::find_one(pool, id).await
    }

    async fn find_many(
        pool: &DbPool,
        query: &ResolvedQuery,
    ) -> Result<Vec<UserResponse>, AppError> {
        let users = UserRepo::list(pool, query).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn create_one(
        pool: &DbPool,
        input: CreateUserRequest,
        photo: Option<String>,
        _creator: Option<DbId>,
    ) -> Result<UserResponse, AppError> {
        require_non_blank("name", &input.name)?;
        validate_new_password(&input.password, &input.password_confirm)?;
        let role = input.role.unwrap_or_else(|| ROLE_USER.to_string());
        validate_role(&role)?;

        let password_hash = hash_password(&input.password)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

        let user = UserRepo::create(
            pool,
            &CreateUser {
                name: input.name.trim().to_string(),
                email: normalize_email(&input.email),
                password_hash,
                role,
                photo,
            },
        )
        .await?;
        Ok(user.into())
    }

    async fn update_one(
        pool: &DbPool,
        id: DbId,
        input: UpdateUserRequest,
        photo: Option<String>,
    ) -> Result<Option<UserResponse>, AppError> {
        if let Some(role) = &input.role {
            validate_role(role)?;
        }
        if let Some(name) = &input.name {
            require_non_blank("name", name)?;
        }

        let update = UpdateUser {
            name: input.name.map(|n| n.trim().to_string()),
            email: input.email.as_deref().map(normalize_email),
            role: input.role,
            active: input.active,
            photo,
        };
        Ok(UserRepo::update(pool, id, &update)
            .await?
            .map(UserResponse::from))
    }

    async fn delete_one(pool: &DbPool, id: DbId) -> Result<Option<UserResponse>, AppError> {
        Ok(UserRepo::delete(pool, id).await?.map(UserResponse::from))
    }

    async fn soft_delete_one(pool: &DbPool, id: DbId) -> Result<bool, AppError> {
        Ok(UserRepo::deactivate(pool, id).await?)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

const EVENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", FieldKind::Integer),
    FieldSpec::new("title", FieldKind::Text),
    FieldSpec::new("date", FieldKind::Timestamp),
    FieldSpec::new("max_participants", FieldKind::Integer),
    FieldSpec::new("attendee_count", FieldKind::Integer),
    FieldSpec::new("price", FieldKind::Float),
    FieldSpec::new("location_city", FieldKind::Text),
    FieldSpec::new("location_country", FieldKind::Text),
    FieldSpec::new("created_by", FieldKind::Integer),
    FieldSpec::new("created_at", FieldKind::Timestamp),
    FieldSpec::new("updated_at", FieldKind::Timestamp),
];

pub const CAPACITY_BELOW_ATTENDEES: &str =
    "max_participants cannot be lower than the current number of attendees";

#[async_trait]
impl Resource for EventRepo {
    type Record = Event;
    type Detail = EventDetail;
    type Create = CreateEventRequest;
    type Update = UpdateEventRequest;

    const NAME: &'static str = "Event";
    const FIELDS: &'static [FieldSpec] = EVENT_FIELDS;
    const PHOTOS: Option<PhotoPolicy> = Some(EVENT_PHOTOS);
    const STAMPS_CREATOR: bool = true;

    fn photo_of(record: &Event) -> &str {
        &record.photo
    }

    async fn find_one(pool: &DbPool, id: DbId) -> Result<Option<Event>, AppError> {
        Ok(EventRepo::find_by_id(pool, id).await?)
    }

    async fn find_populated(pool: &DbPool, id: DbId) -> Result<Option<EventDetail>, AppError> {
        let Some(event) = EventRepo::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let attendees = EventRepo::list_attendees(pool, id).await?;
        let creator = UserRepo::find_summary(pool, event.created_by).await?;
        Ok(Some(EventDetail::new(event, attendees, creator)))
    }

    async fn find_many(pool: &DbPool, query: &ResolvedQuery) -> Result<Vec<Event>, AppError> {
        Ok(EventRepo::list(pool, query).await?)
    }

    async fn create_one(
        pool: &DbPool,
        input: CreateEventRequest,
        photo: Option<String>,
        creator: Option<DbId>,
    ) -> Result<Event, AppError> {
        let created_by = creator
            .ok_or_else(|| AppError::InternalError("Event creator is missing".into()))?;
        require_non_blank("title", &input.title)?;
        require_non_blank("location.address", &input.location.address)?;

        let event = EventRepo::create(
            pool,
            &CreateEvent {
                title: input.title.trim().to_string(),
                description: input.description,
                date: input.date,
                max_participants: input.max_participants,
                location: Location {
                    address: input.location.address,
                    city: input.location.city,
                    country: input.location.country,
                },
                photo,
                price: input.price,
                created_by,
            },
        )
        .await?;
        Ok(event)
    }

    async fn update_one(
        pool: &DbPool,
        id: DbId,
        input: UpdateEventRequest,
        photo: Option<String>,
    ) -> Result<Option<Event>, AppError> {
        if let Some(title) = &input.title {
            require_non_blank("title", title)?;
        }
        input.check_price()?;
        let location = input.location.unwrap_or_default();

        let update = UpdateEvent {
            title: input.title.map(|t| t.trim().to_string()),
            description: input.description,
            date: input.date,
            max_participants: input.max_participants,
            location_address: location.address,
            location_city: location.city,
            location_country: location.country,
            photo,
            price: input.price,
        };

        if let Some(event) = EventRepo::update(pool, id, &update).await? {
            return Ok(Some(event));
        }
        // Either the event is gone or the capacity guard refused the update.
        if EventRepo::exists(pool, id).await? {
            return Err(AppError::Core(CoreError::Validation(
                CAPACITY_BELOW_ATTENDEES.into(),
            )));
        }
        Ok(None)
    }

    async fn delete_one(pool: &DbPool, id: DbId) -> Result<Option<Event>, AppError> {
        Ok(EventRepo::delete(pool, id).await?)
    }
}
