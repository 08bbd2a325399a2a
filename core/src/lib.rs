//! Client core for a remote books collection.
//!
//! # Overview
//! Keeps an ordered list of books mirrored from a `/books` REST resource and
//! mediates create, update and delete through the screen's form state. HTTP
//! is described as plain data (host-does-IO pattern): the core builds
//! `HttpRequest` values and consumes `HttpResponse` values, and either the
//! host or a `Transport` implementation does the round-trip.
//!
//! # Design
//! - `BooksApi` is stateless: it holds only `base_url` and splits every call
//!   into `build_*` and `parse_*`.
//! - `BookListClient` owns the list and the form state. Create and update
//!   are followed by a full refresh; only delete edits the list locally.
//! - Failures are logged through `tracing`; failed mutations also queue an
//!   `Alert` for the UI.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod book_list;
pub mod error;
pub mod http;
pub mod settings;
pub mod transport;
pub mod types;

pub use api::BooksApi;
pub use book_list::{Alert, BookListClient, Completion, FormState, Operation, Pending};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use settings::ClientSettings;
pub use transport::{Transport, UreqTransport};
pub use types::{Book, BookDraft, BookId, DraftField};
