//! Persistence of books. The only place that knows SQL.

use std::str::FromStr;

use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    QueryBuilder, Sqlite,
};
use thiserror::Error;

use crate::model::{Book, BookFilters, BookUpdate, NewBook};

const BOOK_COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLx connection url, e.g. `sqlite://books.db` or `sqlite::memory:`.
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
        }
    }

    fn default_max_connections() -> u32 {
        5
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("There is no book with an isbn '{isbn}'")]
    NotFound { isbn: String },
    #[error("A book with an isbn '{isbn}' already exists")]
    Conflict { isbn: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

enum FilterValue<'a> {
    Text(&'a str),
    Integer(i32),
}

impl BookFilters {
    fn constraints(&self) -> Vec<(&'static str, FilterValue<'_>)> {
        let text = [
            ("isbn", &self.isbn),
            ("amazon_url", &self.amazon_url),
            ("author", &self.author),
            ("language", &self.language),
            ("publisher", &self.publisher),
            ("title", &self.title),
        ];
        let integer = [("pages", self.pages), ("year", self.year)];

        text.into_iter()
            .filter_map(|(column, value)| {
                value
                    .as_deref()
                    .map(|value| (column, FilterValue::Text(value)))
            })
            .chain(integer.into_iter().filter_map(|(column, value)| {
                value.map(|value| (column, FilterValue::Integer(value)))
            }))
            .collect()
    }
}

/// Book storage backed by a SQLite connection pool.
///
/// Every operation is a single statement. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "connect", skip_all, fields(url = %config.url))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // An in-memory database lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::debug!("Connected");

        Ok(Self::new(pool))
    }

    /// Creates the `books` table if it does not exist yet.
    #[tracing::instrument(name = "init_schema", skip_all)]
    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books (
                isbn TEXT PRIMARY KEY,
                amazon_url TEXT NOT NULL,
                author TEXT NOT NULL,
                language TEXT NOT NULL,
                pages INTEGER NOT NULL,
                publisher TEXT NOT NULL,
                title TEXT NOT NULL,
                year INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(name = "find_all_books", skip(self))]
    pub async fn find_all(&self, filters: &BookFilters) -> Result<Vec<Book>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM books"));

        for (index, (column, value)) in filters.constraints().into_iter().enumerate() {
            query.push(if index == 0 { " WHERE " } else { " AND " });
            query.push(column).push(" = ");

            match value {
                FilterValue::Text(value) => query.push_bind(value),
                FilterValue::Integer(value) => query.push_bind(value),
            };
        }

        query.push(" ORDER BY title");

        let books = query.build_query_as::<Book>().fetch_all(&self.pool).await?;

        tracing::trace!(count = books.len(), "Found");

        Ok(books)
    }

    #[tracing::instrument(name = "find_one_book", skip(self))]
    pub async fn find_one(&self, isbn: &str) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE isbn = $1"
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    #[tracing::instrument(name = "create_book", skip_all, fields(isbn = %new_book.isbn))]
    pub async fn create(&self, new_book: &NewBook) -> Result<Book, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({BOOK_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&new_book.isbn)
        .bind(&new_book.amazon_url)
        .bind(&new_book.author)
        .bind(&new_book.language)
        .bind(new_book.pages)
        .bind(&new_book.publisher)
        .bind(&new_book.title)
        .bind(new_book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict {
                    isbn: new_book.isbn.clone(),
                }
            }
            err => err.into(),
        })?;

        tracing::debug!("Created");

        Ok(book)
    }

    #[tracing::instrument(name = "update_book", skip(self, update))]
    pub async fn update(&self, isbn: &str, update: &BookUpdate) -> Result<Book, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books
             SET amazon_url = $1, author = $2, language = $3, pages = $4,
                 publisher = $5, title = $6, year = $7
             WHERE isbn = $8
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&update.amazon_url)
        .bind(&update.author)
        .bind(&update.language)
        .bind(update.pages)
        .bind(&update.publisher)
        .bind(&update.title)
        .bind(update.year)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })?;

        tracing::debug!("Updated");

        Ok(book)
    }

    #[tracing::instrument(name = "remove_book", skip(self))]
    pub async fn remove(&self, isbn: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        tracing::debug!("Removed");

        Ok(())
    }
}
