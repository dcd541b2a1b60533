pub mod auth;
pub mod events;
pub mod factory;
pub mod users;
