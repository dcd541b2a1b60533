pub mod auth;
pub mod error_detail;
pub mod rbac;
