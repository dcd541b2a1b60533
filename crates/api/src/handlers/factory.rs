//! Generic CRUD operations over any [`Resource`], plus thin Axum handlers
//! wrapping them.
//!
//! Controllers call the plain functions when they need to pick the target id
//! or restrict fields themselves (e.g. `/users/updateMe`); routes that are a
//! straight mapping use the `*_handler` functions directly:
//!
//! ```ignore
//! .route("/", get(factory::list_handler::<EventRepo, ()>))
//! ```

use axum::extract::{FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::Json;
use eventhub_core::error::CoreError;
use eventhub_core::listing::{project_fields, ListQuery};
use eventhub_core::types::DbId;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::extract::{IdPath, Payload};
use crate::middleware::rbac::RequireAdmin;
use crate::resource::Resource;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;
use crate::uploads::{discard_photo, store_photo};

/// How [`delete_one`] removes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Set `active = false`; the row and its photo stay.
    Soft,
    /// Remove the row and its photo file.
    Hard,
}

/// A record as returned by [`get_one`]: plain, or with references resolved.
#[derive(Serialize)]
#[serde(untagged, bound(serialize = ""))]
pub enum Fetched<R: Resource> {
    Plain(R::Record),
    Populated(R::Detail),
}

fn not_found<R: Resource>(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: R::NAME,
        id,
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Fetch one record by id; with `populate`, references are resolved.
pub async fn get_one<R: Resource>(
    state: &AppState,
    id: DbId,
    populate: bool,
) -> AppResult<Fetched<R>> {
    let found = if populate {
        R::find_populated(&state.pool, id)
            .await?
            .map(Fetched::Populated)
    } else {
        R::find_one(&state.pool, id).await?.map(Fetched::Plain)
    };
    found.ok_or_else(|| not_found::<R>(id))
}

/// Filter, sort, project and page records from raw query-string pairs.
pub async fn get_all<R: Resource>(
    state: &AppState,
    pairs: Vec<(String, String)>,
) -> AppResult<ListResponse<Value>> {
    let query = ListQuery::from_pairs(R::rewrite_params(pairs))?;
    let resolved = query.resolve(R::FIELDS)?;
    let records = R::find_many(&state.pool, &resolved).await?;

    let data = records
        .into_iter()
        .map(|record| {
            let value = serde_json::to_value(record)?;
            Ok(match &query.fields {
                Some(fields) => project_fields(value, fields),
                None => value,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()
        .map_err(|e| AppError::InternalError(format!("Failed to serialize record: {e}")))?;

    Ok(ListResponse::new(data))
}

/// Create a record from a JSON or multipart payload.
///
/// An uploaded photo is stored first and removed again if the insert fails.
/// Resources that stamp creators record `creator` as the owner.
pub async fn create_one<R: Resource>(
    state: &AppState,
    payload: Payload,
    creator: Option<DbId>,
) -> AppResult<R::Record> {
    let input: R::Create = payload.parse()?;
    let photo = store_upload::<R>(state, &payload).await?;
    let creator = if R::STAMPS_CREATOR { creator } else { None };

    match R::create_one(&state.pool, input, photo.clone(), creator).await {
        Ok(record) => Ok(record),
        Err(e) => {
            discard_new_photo::<R>(state, photo);
            Err(e)
        }
    }
}

/// Update a record. With `allowed`, only those payload fields are applied;
/// otherwise the whole payload is.
///
/// A newly uploaded photo replaces the previous one, whose file is removed.
pub async fn update_one<R: Resource>(
    state: &AppState,
    id: DbId,
    mut payload: Payload,
    allowed: Option<&[&str]>,
) -> AppResult<R::Record> {
    if let Some(allowed) = allowed {
        payload.retain_fields(allowed);
    }
    let input: R::Update = payload.parse()?;

    let existing = R::find_one(&state.pool, id)
        .await?
        .ok_or_else(|| not_found::<R>(id))?;
    let photo = store_upload::<R>(state, &payload).await?;

    let updated = match R::update_one(&state.pool, id, input, photo.clone()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            discard_new_photo::<R>(state, photo);
            return Err(not_found::<R>(id));
        }
        Err(e) => {
            discard_new_photo::<R>(state, photo);
            return Err(e);
        }
    };

    if photo.is_some() {
        if let Some(policy) = R::PHOTOS {
            discard_photo(
                state.config.uploads_dir.clone(),
                policy,
                R::photo_of(&existing).to_string(),
            );
        }
    }
    Ok(updated)
}

/// Delete the record with `id`. Hard deletes also remove its photo.
pub async fn delete_one<R: Resource>(state: &AppState, id: DbId, mode: DeleteMode) -> AppResult<()> {
    match mode {
        DeleteMode::Soft => {
            if !R::soft_delete_one(&state.pool, id).await? {
                return Err(not_found::<R>(id));
            }
        }
        DeleteMode::Hard => {
            let removed = R::delete_one(&state.pool, id)
                .await?
                .ok_or_else(|| not_found::<R>(id))?;
            if let Some(policy) = R::PHOTOS {
                discard_photo(
                    state.config.uploads_dir.clone(),
                    policy,
                    R::photo_of(&removed).to_string(),
                );
            }
        }
    }
    tracing::info!(entity = R::NAME, id, ?mode, "Record deleted");
    Ok(())
}

async fn store_upload<R: Resource>(
    state: &AppState,
    payload: &Payload,
) -> AppResult<Option<String>> {
    match (R::PHOTOS, &payload.photo) {
        (_, None) => Ok(None),
        (Some(policy), Some(upload)) => {
            store_photo(&state.config.uploads_dir, &policy, upload)
                .await
                .map(Some)
        }
        (None, Some(_)) => Err(AppError::BadRequest(format!(
            "{} records do not accept photos",
            R::NAME
        ))),
    }
}

fn discard_new_photo<R: Resource>(state: &AppState, photo: Option<String>) {
    if let (Some(policy), Some(name)) = (R::PHOTOS, photo) {
        discard_photo(state.config.uploads_dir.clone(), policy, name);
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET list. `A` is the access extractor: `()` for public listings,
/// `RequireAdmin` for admin-only ones.
pub async fn list_handler<R, A>(
    _access: A,
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<ListResponse<Value>>>
where
    R: Resource,
    A: FromRequestParts<AppState> + Send,
{
    Ok(Json(get_all::<R>(&state, pairs).await?))
}

/// GET one, unpopulated.
pub async fn get_handler<R, A>(
    _access: A,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<DataResponse<Fetched<R>>>>
where
    R: Resource,
    A: FromRequestParts<AppState> + Send,
{
    Ok(Json(DataResponse::new(get_one::<R>(&state, id, false).await?)))
}

/// POST (admin). Responds 201.
pub async fn create_handler<R: Resource>(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    payload: Payload,
) -> AppResult<(StatusCode, Json<DataResponse<R::Record>>)> {
    let record = create_one::<R>(&state, payload, Some(admin.user_id)).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// PATCH by id (admin), whole payload.
pub async fn update_handler<R: Resource>(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id): IdPath,
    payload: Payload,
) -> AppResult<Json<DataResponse<R::Record>>> {
    let record = update_one::<R>(&state, id, payload, None).await?;
    Ok(Json(DataResponse::new(record)))
}

/// DELETE by id (admin), hard. Responds 204.
pub async fn delete_handler<R: Resource>(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<StatusCode> {
    delete_one::<R>(&state, id, DeleteMode::Hard).await?;
    Ok(StatusCode::NO_CONTENT)
}
