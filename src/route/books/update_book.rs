use axum::extract::State;
use serde_json::Value;

use crate::{
    error::{ApiError, BookError, BookErrorType, ErrorVerbosityProvider, ForbiddenFieldError},
    extractor::{json::ApiJson, path::ApiPath, validated::validate_payload},
    model::BookUpdate,
    repository::RepositoryError,
    state::ApiState,
};

use super::BookResponse;

/// Replaces every mutable field of a book.
///
/// A body carrying an `isbn` is rejected before any other check.
/// A missing book is reported as `400`, unlike on the read path.
pub async fn update_book(
    ApiPath(isbn): ApiPath<String>,
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<BookResponse, ApiError> {
    let verbosity = state.error_verbosity();

    if payload.get("isbn").is_some() {
        tracing::warn!("Attempt to change the isbn");

        return Err(ForbiddenFieldError::new(verbosity, "isbn").into());
    }

    let update: BookUpdate = validate_payload(verbosity, payload)?;

    let book = state
        .books()
        .update(&isbn, &update)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound { isbn } => ApiError::from(BookError::new(
                verbosity,
                BookErrorType::NothingToUpdate { isbn },
            )),
            err => ApiError::from_repository_error(verbosity, err),
        })?;

    tracing::info!(isbn = %book.isbn, "Book updated");

    Ok(BookResponse::ok(book))
}
