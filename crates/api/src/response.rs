//! Shared response envelope types for API handlers.
//!
//! Every successful response carries `"status": "success"`. Use these types
//! instead of ad-hoc `serde_json::json!` bodies to keep the envelope
//! consistent.

use serde::Serialize;

pub const STATUS_SUCCESS: &str = "success";

/// `{ "status": "success", "data": T }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            data,
        }
    }
}

/// `{ "status": "success", "results": n, "data": [..] }`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub status: &'static str,
    pub results: usize,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            results: data.len(),
            data,
        }
    }
}

/// `{ "status": "success", "message": ".." }`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: message.into(),
        }
    }
}

/// `{ "status": "success", "token": "..", "data": { "user": .. } }`.
#[derive(Debug, Serialize)]
pub struct TokenResponse<U: Serialize> {
    pub status: &'static str,
    pub token: String,
    pub data: UserEnvelope<U>,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope<U: Serialize> {
    pub user: U,
}

impl<U: Serialize> TokenResponse<U> {
    pub fn new(token: String, user: U) -> Self {
        Self {
            status: STATUS_SUCCESS,
            token,
            data: UserEnvelope { user },
        }
    }
}
