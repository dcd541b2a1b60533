//! Domain rules shared by the database and API crates.
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod listing;
pub mod photo;
pub mod roles;
pub mod rsvp;
pub mod types;
pub mod validation;
