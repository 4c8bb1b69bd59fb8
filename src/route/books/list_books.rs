use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ErrorVerbosityProvider},
    extractor::query::ApiQuery,
    model::{Book, BookFilters},
    state::ApiState,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// `GET /books`, optionally narrowed by equality filters in the query string.
pub async fn list_books(
    ApiQuery(filters): ApiQuery<BookFilters>,
    State(state): State<ApiState>,
) -> Result<ListBooksResponse, ApiError> {
    let books = state
        .books()
        .find_all(&filters)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(ListBooksResponse { books })
}
