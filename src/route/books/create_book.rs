use axum::extract::State;

use crate::{
    error::{ApiError, ErrorVerbosityProvider},
    extractor::validated::ValidatedJson,
    model::NewBook,
    state::ApiState,
};

use super::BookResponse;

/// Creates a book. Responds with `201` and the stored book.
pub async fn create_book(
    State(state): State<ApiState>,
    ValidatedJson(new_book): ValidatedJson<NewBook>,
) -> Result<BookResponse, ApiError> {
    let book = state
        .books()
        .create(&new_book)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    tracing::info!(isbn = %book.isbn, "Book created");

    Ok(BookResponse::created(book))
}
