use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    error::ErrorVerbosity,
    repository::tests::{in_memory_repository, power_up},
    server::{app, ServerConfig},
    state::ApiState,
};

const ISBN: &str = "0691161518";

#[tokio::test]
async fn example_config_is_valid() {
    ServerConfig::from_config_file("config.example.yaml")
        .await
        .expect("Example config is not parsable");
}

/// Router over a fresh in-memory database holding exactly one book.
async fn seeded_app(verbosity: ErrorVerbosity) -> Router {
    let books = in_memory_repository().await;
    books.create(&power_up()).await.expect("Failed to seed book");

    app(ApiState::new(verbosity, books), false)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json = match bytes.is_empty() {
        true => Value::Null,
        false => serde_json::from_slice(&bytes).unwrap(),
    };

    (status, json)
}

fn talking_to_strangers() -> Value {
    json!({
        "isbn": "0316535621",
        "amazon_url": "http://amazon.com",
        "author": "Malcolm Gladwell",
        "language": "English",
        "pages": 123,
        "publisher": "Penguin",
        "title": "Talking to Strangers",
        "year": 2019
    })
}

fn japanese_edition() -> Value {
    json!({
        "amazon_url": "http://amazon.co.jp",
        "author": "M. G.",
        "language": "Japanese",
        "pages": 1234,
        "publisher": "Cat",
        "title": "Updated",
        "year": 2000
    })
}

#[tokio::test]
async fn lists_books() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["isbn"], ISBN);
    assert!(books[0].get("amazon_url").is_some());
}

#[tokio::test]
async fn lists_books_matching_filters() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let uri = "/books?author=Matthew%20Lane&year=2017";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/books?language=Japanese", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], json!([]));

    let (status, body) = send(&app, Method::GET, "/books?year=last", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["error_type"], "Query");
}

#[tokio::test]
async fn gets_a_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::GET, &format!("/books/{ISBN}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], ISBN);
    assert_eq!(body["book"]["pages"], 264);
}

#[tokio::test]
async fn responds_404_for_unknown_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::GET, "/books/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
    assert_eq!(body["error"]["message"], "Book not found");
    assert_eq!(
        body["error"]["details"]["book_error_reason"],
        "There is no book with an isbn '999'"
    );
}

#[tokio::test]
async fn creates_a_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::POST, "/books", Some(talking_to_strangers())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"], talking_to_strangers());

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn prevents_creating_book_without_title() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let payload = json!({ "year": 2000 });
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);
    assert_eq!(body["error"]["error_type"], "Validation");
    let messages = body["error"]["message"].as_array().unwrap();
    assert!(messages.contains(&json!("missing required property title")));
}

#[tokio::test]
async fn prevents_creating_book_with_string_pages_or_empty_title() {
    let app = seeded_app(ErrorVerbosity::Message).await;

    let mut payload = talking_to_strangers();
    payload["pages"] = json!("123");
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": { "status": 400, "message": ["pages is not of type integer"] } })
    );

    let mut payload = talking_to_strangers();
    payload["title"] = json!("");
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], json!(["title: Must not be empty"]));
}

#[tokio::test]
async fn rejects_malformed_json() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responds_409_for_duplicate_isbn() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let mut payload = talking_to_strangers();
    payload["isbn"] = json!(ISBN);
    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Book already exists");
}

#[tokio::test]
async fn updates_a_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{ISBN}"),
        Some(japanese_edition()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["isbn"], ISBN);
    assert_eq!(body["book"]["title"], "Updated");

    let (_, body) = send(&app, Method::GET, &format!("/books/{ISBN}"), None).await;
    assert_eq!(body["book"]["language"], "Japanese");
}

#[tokio::test]
async fn prevents_changing_the_isbn() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{ISBN}"),
        Some(json!({ "isbn": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Not allowed");

    let mut payload = japanese_edition();
    payload["isbn"] = json!("123");
    let (status, _) = send(&app, Method::PUT, &format!("/books/{ISBN}"), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, &format!("/books/{ISBN}"), None).await;
    assert_eq!(body["book"]["language"], "English");
}

#[tokio::test]
async fn prevents_incomplete_update() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{ISBN}"),
        Some(json!({ "title": "Only a title" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["error_type"], "Validation");
}

#[tokio::test]
async fn responds_400_when_updating_a_deleted_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{ISBN}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{ISBN}"),
        Some(japanese_edition()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Book could not be updated");

    let (status, _) = send(&app, Method::PUT, &format!("/books/{ISBN}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deletes_a_book() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{ISBN}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&app, Method::GET, &format!("/books/{ISBN}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{ISBN}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_and_methods_are_api_errors() {
    let app = seeded_app(ErrorVerbosity::Type).await;

    let (status, body) = send(&app, Method::GET, "/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["error_type"], "NotFound");

    let (status, body) = send(&app, Method::PATCH, "/books", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["message"], "Method not allowed");
}

#[tokio::test]
async fn verbosity_controls_error_body() {
    let app = seeded_app(ErrorVerbosity::StatusCode).await;
    let (status, body) = send(&app, Method::GET, "/books/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);

    let app = seeded_app(ErrorVerbosity::Type).await;
    let (_, body) = send(&app, Method::GET, "/books/999", None).await;
    assert_eq!(body["error"]["error_type"], "Book");
    assert_eq!(body["error"]["details"]["book_error_reason"], Value::Null);

    let app = seeded_app(ErrorVerbosity::None).await;
    let (status, _) = send(&app, Method::GET, "/books/999", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn prevents_creating_book_with_out_of_range_numbers() {
    let app = seeded_app(ErrorVerbosity::Full).await;

    let cases = [
        ("pages", json!(0), json!(["pages: Must be a positive number"])),
        ("pages", json!(-5), json!(["pages: Must be a positive number"])),
        ("year", json!(10000), json!(["year: Must be between 1 and 9999"])),
        (
            "pages",
            json!(3_000_000_000u64),
            json!(["pages is out of the 32-bit integer range"]),
        ),
    ];

    for (field, value, expected) in cases {
        let mut payload = talking_to_strangers();
        payload[field] = value;

        let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["error_type"], "Validation");
        assert_eq!(body["error"]["message"], expected);
    }

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn prevents_updating_book_with_out_of_range_numbers() {
    let app = seeded_app(ErrorVerbosity::Full).await;
    let uri = format!("/books/{ISBN}");

    let cases = [
        ("pages", json!(0), json!(["pages: Must be a positive number"])),
        ("year", json!(10000), json!(["year: Must be between 1 and 9999"])),
        (
            "year",
            json!(-3_000_000_000i64),
            json!(["year is out of the 32-bit integer range"]),
        ),
    ];

    for (field, value, expected) in cases {
        let mut payload = japanese_edition();
        payload[field] = value;

        let (status, body) = send(&app, Method::PUT, &uri, Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], expected);
    }

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["book"]["pages"], 264);
    assert_eq!(body["book"]["year"], 2017);
}
