//! Request extractors shared by the handlers: path ids, validated JSON, and
//! JSON-or-multipart payloads.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::Json;
use eventhub_core::photo::PHOTO_FIELD;
use eventhub_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Path ids
// ---------------------------------------------------------------------------

/// A positive record id taken from the single `{id}` path parameter.
///
/// Anything that is not a positive integer is rejected as
/// [`AppError::InvalidId`] before a handler runs.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub DbId);

impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match raw.parse::<DbId>() {
            Ok(id) if id > 0 => Ok(IdPath(id)),
            _ => Err(AppError::InvalidId(raw)),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated JSON
// ---------------------------------------------------------------------------

/// JSON body that has passed its `validator` rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}

/// Flatten `validator` errors into one client message, fields in name order.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {field}"),
            })
        })
        .collect();

    if messages.is_empty() {
        AppError::BadRequest(format!("Invalid input data. {errors}"))
    } else {
        AppError::BadRequest(format!("Invalid input data. {}", messages.join(". ")))
    }
}

// ---------------------------------------------------------------------------
// JSON or multipart payloads
// ---------------------------------------------------------------------------

/// An uploaded photo held in memory until it is validated and stored.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of a create/update request: a JSON object, or multipart form data
/// with text fields and an optional `photo` file.
///
/// Multipart text fields stay strings, except JSON objects and arrays
/// (`location`). Numeric and boolean request fields accept either form
/// through the [`lenient`] helpers.
#[derive(Debug, Default)]
pub struct Payload {
    pub fields: Map<String, Value>,
    pub photo: Option<PhotoUpload>,
}

impl Payload {
    /// Keep only the listed fields.
    pub fn retain_fields(&mut self, allowed: &[&str]) {
        self.fields.retain(|key, _| allowed.contains(&key.as_str()));
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Deserialize the text fields into `T` and run its validation rules.
    pub fn parse<T>(&self) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| AppError::BadRequest(format!("Invalid input data. {e}")))?;
        value.validate().map_err(validation_error)?;
        Ok(value)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut payload = Payload::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == PHOTO_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                payload.photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            payload.fields.insert(name, parse_form_value(text));
        }

        Ok(payload)
    }
}

fn parse_form_value(text: String) -> Value {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let parsed = serde_json::from_str::<Value>(&text);
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = parsed {
            return value;
        }
    }
    Value::String(text)
}

impl<S: Send + Sync> FromRequest<S> for Payload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Payload::from_multipart(multipart).await;
        }

        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match value {
            Value::Object(fields) => Ok(Payload {
                fields,
                photo: None,
            }),
            _ => Err(AppError::BadRequest(
                "Request body must be a JSON object".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers for request types
// ---------------------------------------------------------------------------

/// `#[serde(default, deserialize_with = "present")]` on an
/// `Option<Option<T>>`: absent stays `None`, `null` becomes `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Numbers and booleans that may arrive as multipart text (`"10"`, `"true"`).
pub mod lenient {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Typed(T),
        Text(String),
    }

    fn coerce<T, E>(raw: Raw<T>) -> Result<T, E>
    where
        T: FromStr,
        T::Err: Display,
        E: Error,
    {
        match raw {
            Raw::Typed(value) => Ok(value),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| E::custom(format!("invalid value {text:?}: {e}"))),
        }
    }

    /// Required field.
    pub fn value<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        coerce(Raw::<T>::deserialize(deserializer)?)
    }

    /// Optional field; use with `#[serde(default)]`. Blank text counts as
    /// missing.
    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Option::<Raw<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(raw) => coerce(raw).map(Some),
        }
    }

    /// Nullable column in a partial update; use with `#[serde(default)]`.
    /// `null` or blank text clears it.
    pub fn patch<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        option(deserializer).map(Some)
    }
}
