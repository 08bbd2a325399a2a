use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub img: String,
}

/// Body of `POST /books` and `PUT /books/{id}`. Missing fields default to
/// empty strings; `PUT` replaces every field.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub img: String,
}

/// Books in insertion order, the order `GET /books` returns them in.
pub type Db = Arc<RwLock<Vec<Book>>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router whose store starts out holding `books`.
pub fn app_with(books: Vec<Book>) -> Router {
    let db: Db = Arc::new(RwLock::new(books));
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_books(State(db): State<Db>) -> Json<Vec<Book>> {
    let books = db.read().await;
    Json(books.clone())
}

async fn create_book(
    State(db): State<Db>,
    Json(input): Json<BookInput>,
) -> (StatusCode, Json<Book>) {
    let book = Book {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        author: input.author,
        genre: input.genre,
        img: input.img,
    };
    tracing::info!(id = %book.id, title = %book.title, "book created");
    db.write().await.push(book.clone());
    (StatusCode::CREATED, Json(book))
}

async fn update_book(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<BookInput>,
) -> Result<Json<Book>, StatusCode> {
    let mut books = db.write().await;
    let book = books
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    book.title = input.title;
    book.author = input.author;
    book.genre = input.genre;
    book.img = input.img;
    tracing::info!(%id, "book updated");
    Ok(Json(book.clone()))
}

async fn delete_book(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut books = db.write().await;
    let position = books
        .iter()
        .position(|b| b.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    books.remove(position);
    tracing::info!(%id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
