use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::model::Book;

pub mod app;
pub mod create_book;
pub mod delete_book;
pub mod get_book;
pub mod list_books;
pub mod update_book;

/// `{book: {...}}` with a configurable status.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    #[serde(skip)]
    status: StatusCode,
    pub book: Book,
}

impl BookResponse {
    pub fn ok(book: Book) -> Self {
        Self {
            status: StatusCode::OK,
            book,
        }
    }

    pub fn created(book: Book) -> Self {
        Self {
            status: StatusCode::CREATED,
            book,
        }
    }
}

impl IntoResponse for BookResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
