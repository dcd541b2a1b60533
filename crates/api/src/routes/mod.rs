pub mod events;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/signup                      signup (public)
/// /users/login                       login (public)
/// /users/logout                      logout (public)
/// /users/forgotPassword              issue reset token (public)
/// /users/resetPassword/{token}       reset password (public)
/// /users/updateMyPassword            change password (auth)
/// /users/me                          current user (auth)
/// /users/updateMe                    update own profile (auth)
/// /users/deleteMe                    deactivate own account (auth)
/// /users                             list, create (admin)
/// /users/{id}                        get, update, delete (admin)
///
/// /events                            list (public), create (admin)
/// /events/myEvents                   events the caller attends (auth)
/// /events/{id}                       get (public), update, delete (admin)
/// /events/{id}/attend                attend (user role)
/// /events/{id}/unattend              unattend (user role)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/events", events::router())
}
