use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A book as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Book {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// Payload of `POST /books`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub pages: i32,
    pub publisher: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: String,
    #[validate(range(min = 1, max = 9999, message = "Must be between 1 and 9999"))]
    pub year: i32,
}

/// Payload of `PUT /books/:isbn`.
///
/// Replaces every mutable column. The isbn is taken from the path and can never change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct BookUpdate {
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub pages: i32,
    pub publisher: String,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: String,
    #[validate(range(min = 1, max = 9999, message = "Must be between 1 and 9999"))]
    pub year: i32,
}

/// Equality constraints for `GET /books`. Absent fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct BookFilters {
    pub isbn: Option<String>,
    pub amazon_url: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i32>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
}
