//! Route definitions for the `/users` resource.

use axum::routing::{delete, get, patch, post};
use axum::Router;
use eventhub_db::repositories::UserRepo;

use crate::handlers::{auth, factory, users};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// Static segments are registered alongside `/{id}`; axum prefers the
/// static match, so `/users/me` never reaches the id extractor.
///
/// ```text
/// POST   /signup                 -> signup
/// POST   /login                  -> login
/// GET    /logout                 -> logout
/// POST   /forgotPassword         -> forgot_password
/// PATCH  /resetPassword/{token}  -> reset_password
/// PATCH  /updateMyPassword       -> update_my_password
/// GET    /me                     -> get_me
/// PATCH  /updateMe               -> update_me
/// DELETE /deleteMe               -> delete_me
/// GET    /                       -> list (admin)
/// POST   /                       -> create (admin)
/// GET    /{id}                   -> get (admin)
/// PATCH  /{id}                   -> update (admin)
/// DELETE /{id}                   -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/forgotPassword", post(auth::forgot_password))
        .route("/resetPassword/{token}", patch(auth::reset_password))
        .route("/updateMyPassword", patch(auth::update_my_password))
        .route("/me", get(users::get_me))
        .route("/updateMe", patch(users::update_me))
        .route("/deleteMe", delete(users::delete_me))
        .route(
            "/",
            get(factory::list_handler::<UserRepo, RequireAdmin>)
                .post(factory::create_handler::<UserRepo>),
        )
        .route(
            "/{id}",
            get(factory::get_handler::<UserRepo, RequireAdmin>)
                .patch(factory::update_handler::<UserRepo>)
                .delete(factory::delete_handler::<UserRepo>),
        )
}
