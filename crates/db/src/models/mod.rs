//! Row models and insert/update DTOs, one module per table.

pub mod booking;
pub mod event;
pub mod user;
