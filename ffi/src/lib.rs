//! C-ABI wrapper around `books-core`.
//!
//! # Overview
//! Exposes `BookListClient` through `extern "C"` functions so a mobile host
//! (or any language with a C FFI) can keep the book list and form state in
//! Rust while doing the HTTP I/O itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `books_client_begin_*` returns an `FfiPending` (request + operation);
//!   the host executes the request and hands the outcome to
//!   `books_client_complete`, which may return a follow-up refresh.
//! - The client handle is not thread-safe; the host calls it from one
//!   thread (its UI thread) at a time.
//! - The C caller owns all returned pointers and must call the matching
//!   `books_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use books_core::{ApiError, BookDraft, BookId, BookListClient, ClientSettings};

use types::*;

/// Run `f`, turning a panic into `fallback()`.
fn guard<R>(name: &str, fallback: impl FnOnce() -> R, f: impl FnOnce() -> R + UnwindSafe) -> R {
    catch_unwind(f).unwrap_or_else(|_| {
        tracing::error!(function = name, "panic caught at FFI boundary");
        fallback()
    })
}

/// Map an id string from C back to a `BookId`. Ids of listed books keep
/// their original JSON type; anything else goes through
/// `BookId::parse_lossless`, so the request path always carries `raw` as is.
fn resolve_id(client: &BookListClient, raw: &str) -> BookId {
    client
        .books()
        .iter()
        .filter_map(|book| book.id.as_ref())
        .find(|id| id.to_string() == raw)
        .cloned()
        .unwrap_or_else(|| BookId::parse_lossless(raw))
}

fn draft_from_c(
    title: *const c_char,
    author: *const c_char,
    genre: *const c_char,
    img: *const c_char,
) -> Option<BookDraft> {
    Some(BookDraft::new(
        from_c_str(title)?,
        from_c_str(author)?,
        from_c_str(genre)?,
        from_c_str(img)?,
    ))
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a stderr `tracing` subscriber for the library's log events.
///
/// `filter` uses `RUST_LOG` syntax (e.g. `"books_core=debug"`); null means
/// `"info"`. Returns false if a subscriber is already installed or the
/// filter does not parse.
#[unsafe(no_mangle)]
pub extern "C" fn books_init_logging(filter: *const c_char) -> bool {
    guard("books_init_logging", || false, || {
        let Ok(filter) = tracing_subscriber::EnvFilter::try_new(from_c_str(filter).unwrap_or("info"))
        else {
            return false;
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url` with an empty list.
///
/// A null `base_url` reads `BOOKS_BASE_URL` (after an optional `.env`) and
/// falls back to `http://localhost:3000`. Returns null if `base_url` is not
/// UTF-8 or the settings fail to load.
/// The caller must free the returned pointer with `books_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_new(base_url: *const c_char) -> *mut FfiBookListClient {
    guard("books_client_new", std::ptr::null_mut, || {
        let client = if base_url.is_null() {
            match ClientSettings::load() {
                Ok(settings) => BookListClient::from_settings(&settings),
                Err(err) => {
                    tracing::error!(error = %err, "could not load client settings");
                    return std::ptr::null_mut();
                }
            }
        } else {
            let Some(url) = from_c_str(base_url) else {
                return std::ptr::null_mut();
            };
            BookListClient::new(url)
        };
        Box::into_raw(Box::new(FfiBookListClient { inner: client }))
    })
}

/// Free a client created by `books_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_free(client: *mut FfiBookListClient) {
    if !client.is_null() {
        guard("books_client_free", || (), || {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Begin operations
// ---------------------------------------------------------------------------

/// Begin a refresh of the whole list.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_refresh(client: *const FfiBookListClient) -> *mut FfiPending {
    guard("books_client_begin_refresh", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiPending::from_core(client.inner.begin_refresh())
    })
}

/// Begin creating a book from explicit field values.
///
/// Returns null if any argument is null or not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_create(
    client: *const FfiBookListClient,
    title: *const c_char,
    author: *const c_char,
    genre: *const c_char,
    img: *const c_char,
) -> *mut FfiPending {
    guard("books_client_begin_create", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(draft) = draft_from_c(title, author, genre, img) else {
            return std::ptr::null_mut();
        };
        match client.inner.begin_create(&draft) {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
}

/// Begin replacing every field of the book with `id`.
///
/// Returns null if any argument is null, not UTF-8, or `id` is empty.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_update(
    client: *const FfiBookListClient,
    id: *const c_char,
    title: *const c_char,
    author: *const c_char,
    genre: *const c_char,
    img: *const c_char,
) -> *mut FfiPending {
    guard("books_client_begin_update", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(raw_id) = from_c_str(id).filter(|s| !s.is_empty()) else {
            return std::ptr::null_mut();
        };
        let Some(draft) = draft_from_c(title, author, genre, img) else {
            return std::ptr::null_mut();
        };
        let id = resolve_id(&client.inner, raw_id);
        match client.inner.begin_update(&id, &draft) {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
}

/// Begin deleting the book with `id`.
///
/// Returns null if `client` or `id` is null, or `id` is empty.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_delete(
    client: *const FfiBookListClient,
    id: *const c_char,
) -> *mut FfiPending {
    guard("books_client_begin_delete", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(raw_id) = from_c_str(id).filter(|s| !s.is_empty()) else {
            return std::ptr::null_mut();
        };
        let id = resolve_id(&client.inner, raw_id);
        FfiPending::from_core(client.inner.begin_delete(&id))
    })
}

/// Begin creating a book from the form draft.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_submit_create(
    client: *const FfiBookListClient,
) -> *mut FfiPending {
    guard("books_client_begin_submit_create", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.begin_submit_create() {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
}

/// Begin updating the selected book from the form draft.
///
/// Returns null when no book with an id is selected.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_begin_submit_update(
    client: *const FfiBookListClient,
) -> *mut FfiPending {
    guard("books_client_begin_submit_update", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.begin_submit_update() {
            Some(Ok(pending)) => FfiPending::from_core(pending),
            Some(Err(_)) | None => std::ptr::null_mut(),
        }
    })
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Apply the outcome of `pending` and consume it.
///
/// Pass the received `response`, or null together with an optional
/// `transport_error` description when no response arrived. The returned
/// completion must be freed with `books_free_completion`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_complete(
    client: *mut FfiBookListClient,
    pending: *mut FfiPending,
    response: *const FfiHttpResponse,
    transport_error: *const c_char,
) -> *mut FfiCompletion {
    guard(
        "books_client_complete",
        || FfiCompletion::failure(FfiErrorCode::Panic, "panic in books_client_complete"),
        || {
            if client.is_null() {
                FfiPending::into_operation(pending);
                return FfiCompletion::null_arg("client");
            }
            let Some(op) = FfiPending::into_operation(pending) else {
                return FfiCompletion::null_arg("pending");
            };
            let client = unsafe { &mut *client };
            let outcome = if response.is_null() {
                let msg = from_c_str(transport_error).unwrap_or("no response");
                Err(ApiError::Transport(msg.to_string()))
            } else {
                Ok(unsafe { &*response }.to_core())
            };
            let completion = client.inner.complete(op, outcome);
            FfiCompletion::from_core(completion.result, completion.follow_up)
        },
    )
}

/// Detach the follow-up request from a completion so it survives
/// `books_free_completion`. Returns null when there is none.
#[unsafe(no_mangle)]
pub extern "C" fn books_completion_take_follow_up(completion: *mut FfiCompletion) -> *mut FfiPending {
    guard("books_completion_take_follow_up", std::ptr::null_mut, || {
        if completion.is_null() {
            return std::ptr::null_mut();
        }
        let completion = unsafe { &mut *completion };
        std::mem::replace(&mut completion.follow_up, std::ptr::null_mut())
    })
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// Set one draft field (0 title, 1 author, 2 genre, 3 img).
///
/// Returns false on a null argument or an unknown field.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_set_draft_field(
    client: *mut FfiBookListClient,
    field: u32,
    value: *const c_char,
) -> bool {
    guard("books_client_set_draft_field", || false, || {
        if client.is_null() {
            return false;
        }
        let (Some(field), Some(value)) = (draft_field(field), from_c_str(value)) else {
            return false;
        };
        let client = unsafe { &mut *client };
        client.inner.set_draft_field(field, value);
        true
    })
}

/// Show or hide the create form. Returns the new visibility.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_toggle_create_form(client: *mut FfiBookListClient) -> bool {
    guard("books_client_toggle_create_form", || false, || {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        client.inner.toggle_create_form()
    })
}

/// Select the book at `index` and open the update modal.
///
/// Returns false on a null client or an out-of-range index.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_open_book(client: *mut FfiBookListClient, index: u32) -> bool {
    guard("books_client_open_book", || false, || {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        client.inner.open_book(index as usize)
    })
}

/// Hide the modal and both forms.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_close_modal(client: *mut FfiBookListClient) {
    guard("books_client_close_modal", || (), || {
        if client.is_null() {
            return;
        }
        let client = unsafe { &mut *client };
        client.inner.close_modal();
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn books_client_form_flags(client: *const FfiBookListClient) -> FfiFormFlags {
    let hidden = FfiFormFlags {
        modal_visible: false,
        show_create_form: false,
        show_update_form: false,
        has_selection: false,
    };
    guard("books_client_form_flags", move || hidden, move || {
        if client.is_null() {
            return hidden;
        }
        let form = unsafe { &*client }.inner.form();
        FfiFormFlags {
            modal_visible: form.modal_visible,
            show_create_form: form.show_create_form,
            show_update_form: form.show_update_form,
            has_selection: form.selected.is_some(),
        }
    })
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Snapshot of the form draft. Free with `books_free_book`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_draft(client: *const FfiBookListClient) -> *mut FfiBook {
    guard("books_client_draft", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        Box::into_raw(Box::new(FfiBook::from_draft(client.inner.draft())))
    })
}

/// Snapshot of the selected book, or null. Free with `books_free_book`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_selected(client: *const FfiBookListClient) -> *mut FfiBook {
    guard("books_client_selected", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match client.inner.selected() {
            Some(book) => Box::into_raw(Box::new(FfiBook::from_book(book))),
            None => std::ptr::null_mut(),
        }
    })
}

/// Snapshot of the local list. Free with `books_free_book_list`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_books(client: *const FfiBookListClient) -> *mut FfiBookList {
    guard("books_client_books", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiBookList::from_books(client.inner.books())
    })
}

/// The local list as a JSON array, ids in their server form. Free with
/// `books_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_books_json(client: *const FfiBookListClient) -> *mut c_char {
    guard("books_client_books_json", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match serde_json::to_string(client.inner.books()) {
            Ok(json) => to_c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    })
}

/// Pop the oldest queued alert, or null when none is queued. Free with
/// `books_free_alert`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_next_alert(client: *mut FfiBookListClient) -> *mut FfiAlert {
    guard("books_client_next_alert", std::ptr::null_mut, || {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &mut *client };
        client
            .inner
            .next_alert()
            .map_or(std::ptr::null_mut(), FfiAlert::from_core)
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a pending request that will not be completed. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_pending(pending: *mut FfiPending) {
    if pending.is_null() {
        return;
    }
    guard("books_free_pending", || (), || {
        FfiPending::into_operation(pending);
    });
}

/// Free a completion, including any follow-up still attached to it.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_completion(completion: *mut FfiCompletion) {
    if completion.is_null() {
        return;
    }
    guard("books_free_completion", || (), || {
        let completion = unsafe { Box::from_raw(completion) };
        free_c_string(completion.error_message);
        FfiPending::into_operation(completion.follow_up);
    });
}

/// Free a book from `books_client_draft` or `books_client_selected`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_book(book: *mut FfiBook) {
    if book.is_null() {
        return;
    }
    guard("books_free_book", || (), || {
        let book = unsafe { Box::from_raw(book) };
        book.free_fields();
    });
}

/// Free a list from `books_client_books`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_book_list(list: *mut FfiBookList) {
    guard("books_free_book_list", || (), || FfiBookList::free(list));
}

/// Free an alert from `books_client_next_alert`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_alert(alert: *mut FfiAlert) {
    if alert.is_null() {
        return;
    }
    guard("books_free_alert", || (), || {
        let alert = unsafe { Box::from_raw(alert) };
        free_c_string(alert.title);
        free_c_string(alert.message);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_string(s: *mut c_char) {
    guard("books_free_string", || (), || free_c_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
