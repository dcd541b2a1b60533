//! Route definitions for the `/events` resource.

use axum::routing::{get, patch};
use axum::Router;
use eventhub_db::repositories::EventRepo;

use crate::handlers::{events, factory};
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                -> list (public)
/// POST   /                -> create (admin)
/// GET    /myEvents        -> my_events
/// GET    /{id}            -> get_event (public, populated)
/// PATCH  /{id}            -> update (admin)
/// DELETE /{id}            -> delete (admin)
/// PATCH  /{id}/attend     -> attend
/// PATCH  /{id}/unattend   -> unattend
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(factory::list_handler::<EventRepo, ()>)
                .post(factory::create_handler::<EventRepo>),
        )
        .route("/myEvents", get(events::my_events))
        .route(
            "/{id}",
            get(events::get_event)
                .patch(factory::update_handler::<EventRepo>)
                .delete(factory::delete_handler::<EventRepo>),
        )
        .route("/{id}/attend", patch(events::attend))
        .route("/{id}/unattend", patch(events::unattend))
}
