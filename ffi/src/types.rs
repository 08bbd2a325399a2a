//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion and release helpers live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use books_core::{
    Alert, ApiError, Book, BookDraft, BookListClient, DraftField, HttpMethod, HttpResponse,
    Operation, Pending,
};

/// Opaque handle to a `BookListClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiBookListClient {
    pub(crate) inner: BookListClient,
}

/// Opaque operation tag carried by an `FfiPending`.
pub struct FfiOperation {
    pub(crate) inner: Operation,
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Copy a Rust string into a C string owned by the caller. Interior NULs are
/// dropped rather than failing the whole conversion.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut bytes = s.into().into_bytes();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Borrow a C string as UTF-8. Null or invalid UTF-8 yields `None`.
pub(crate) fn from_c_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request has no body.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: books_core::HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }

    /// Release a request built by `from_core`. Null is ignored.
    pub(crate) fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

/// A request waiting for its outcome, plus the operation it belongs to.
///
/// Pass it back to `books_client_complete`, which consumes it, or release it
/// unused with `books_free_pending`.
#[repr(C)]
pub struct FfiPending {
    pub request: *mut FfiHttpRequest,
    pub op: *mut FfiOperation,
}

impl FfiPending {
    pub(crate) fn from_core(pending: Pending) -> *mut Self {
        Box::into_raw(Box::new(FfiPending {
            request: FfiHttpRequest::from_core(pending.request),
            op: Box::into_raw(Box::new(FfiOperation { inner: pending.op })),
        }))
    }

    /// Free the request and hand back the operation. Null is `None`.
    pub(crate) fn into_operation(pending: *mut Self) -> Option<Operation> {
        if pending.is_null() {
            return None;
        }
        let pending = unsafe { Box::from_raw(pending) };
        FfiHttpRequest::free(pending.request);
        if pending.op.is_null() {
            return None;
        }
        let op = unsafe { Box::from_raw(pending.op) };
        Some(op.inner)
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request, then passes a
/// pointer to `books_client_complete`. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// Invalid UTF-8 in the body is replaced with U+FFFD, so the status
    /// still counts and a list body fails on its content, not on a
    /// truncated read.
    pub(crate) fn to_core(&self) -> HttpResponse {
        let body = if self.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(self.body) }.to_string_lossy().into_owned()
        };
        HttpResponse::new(self.status, body)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiCompletion`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Transport = 2,
    Deserialization = 3,
    Serialization = 4,
    Panic = 5,
    NullArg = 6,
}

/// Outcome of `books_client_complete`.
///
/// On success `error_code` is `Ok` and `error_message` is null. `follow_up`
/// is non-null when the completed operation triggers a refresh; execute it
/// and complete it like any other pending request.
#[repr(C)]
pub struct FfiCompletion {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub follow_up: *mut FfiPending,
}

impl FfiCompletion {
    pub(crate) fn from_core(result: Result<(), ApiError>, follow_up: Option<Pending>) -> *mut Self {
        let follow_up = follow_up.map_or(std::ptr::null_mut(), FfiPending::from_core);
        let (error_code, http_status, error_message) = match result {
            Ok(()) => (FfiErrorCode::Ok, 0, std::ptr::null_mut()),
            Err(err) => {
                let code = match &err {
                    ApiError::Status { .. } => FfiErrorCode::Http,
                    ApiError::Transport(_) => FfiErrorCode::Transport,
                    ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
                    ApiError::Serialization(_) => FfiErrorCode::Serialization,
                };
                (code, err.status().unwrap_or(0), to_c_string(err.to_string()))
            }
        };
        Box::into_raw(Box::new(FfiCompletion {
            error_code,
            error_message,
            http_status,
            follow_up,
        }))
    }

    pub(crate) fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiCompletion {
            error_code,
            error_message: to_c_string(msg),
            http_status: 0,
            follow_up: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }
}

// ---------------------------------------------------------------------------
// Books and form state
// ---------------------------------------------------------------------------

/// A book exposed to C. `id` is null for drafts and for server records
/// without one.
#[repr(C)]
pub struct FfiBook {
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub author: *mut c_char,
    pub genre: *mut c_char,
    pub img: *mut c_char,
}

impl FfiBook {
    pub(crate) fn from_book(book: &Book) -> Self {
        FfiBook {
            id: book
                .id
                .as_ref()
                .map_or(std::ptr::null_mut(), |id| to_c_string(id.to_string())),
            title: to_c_string(book.title.as_str()),
            author: to_c_string(book.author.as_str()),
            genre: to_c_string(book.genre.as_str()),
            img: to_c_string(book.img.as_str()),
        }
    }

    pub(crate) fn from_draft(draft: &BookDraft) -> Self {
        FfiBook {
            id: std::ptr::null_mut(),
            title: to_c_string(draft.title.as_str()),
            author: to_c_string(draft.author.as_str()),
            genre: to_c_string(draft.genre.as_str()),
            img: to_c_string(draft.img.as_str()),
        }
    }

    /// Free the C-string fields (but not the struct itself).
    pub(crate) fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.title);
        free_c_string(self.author);
        free_c_string(self.genre);
        free_c_string(self.img);
    }
}

/// A snapshot of the local book list.
#[repr(C)]
pub struct FfiBookList {
    pub items: *mut FfiBook,
    pub len: u32,
}

impl FfiBookList {
    pub(crate) fn from_books(books: &[Book]) -> *mut Self {
        let len = books.len() as u32;
        let items = if books.is_empty() {
            std::ptr::null_mut()
        } else {
            let items: Box<[FfiBook]> = books.iter().map(FfiBook::from_book).collect();
            Box::into_raw(items) as *mut FfiBook
        };
        Box::into_raw(Box::new(FfiBookList { items, len }))
    }

    pub(crate) fn free(list: *mut Self) {
        if list.is_null() {
            return;
        }
        let list = unsafe { Box::from_raw(list) };
        if !list.items.is_null() && list.len > 0 {
            let items = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(list.items, list.len as usize))
            };
            for item in items.iter() {
                item.free_fields();
            }
        }
    }
}

/// A user-visible error notice.
#[repr(C)]
pub struct FfiAlert {
    pub title: *mut c_char,
    pub message: *mut c_char,
}

impl FfiAlert {
    pub(crate) fn from_core(alert: Alert) -> *mut Self {
        Box::into_raw(Box::new(FfiAlert {
            title: to_c_string(alert.title),
            message: to_c_string(alert.message),
        }))
    }
}

/// Visibility flags of the books screen.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiFormFlags {
    pub modal_visible: bool,
    pub show_create_form: bool,
    pub show_update_form: bool,
    pub has_selection: bool,
}

/// Draft field selector: 0 title, 1 author, 2 genre, 3 img.
pub(crate) fn draft_field(raw: u32) -> Option<DraftField> {
    match raw {
        0 => Some(DraftField::Title),
        1 => Some(DraftField::Author),
        2 => Some(DraftField::Genre),
        3 => Some(DraftField::Img),
        _ => None,
    }
}
