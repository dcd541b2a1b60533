//! Repository layer: one zero-sized struct per table, async methods taking `&PgPool`.

pub mod booking_repo;
pub mod event_repo;
pub mod user_repo;

pub use booking_repo::BookingRepo;
pub use event_repo::EventRepo;
pub use user_repo::UserRepo;

/// SQLSTATE for `unique_violation`.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Whether `err` is a database error with the given SQLSTATE.
pub(crate) fn has_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|c| c == code)
}
