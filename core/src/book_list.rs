//! Local book list kept in step with the remote collection.
//!
//! # Design
//! `BookListClient` never patches the list after create or update: a
//! successful mutation yields a follow-up refresh and the server's answer
//! replaces the list wholesale. Delete is the one exception and filters the
//! deleted id out locally.
//!
//! Every operation has two halves. `begin_*` builds a `Pending` (the request
//! plus the operation it belongs to) without touching state; `complete`
//! applies the outcome. Hosts that do their own I/O call the halves
//! directly and may complete pendings in any order. Rust hosts call
//! `refresh` / `create` / `update` / `delete` with a `Transport`, which run
//! both halves and any follow-up.
//!
//! The client also carries the screen's form state: one draft, at most one
//! selected book, the modal and form visibility flags, and a queue of
//! user-facing alerts raised by failed mutations.

use std::collections::VecDeque;

use crate::api::BooksApi;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::settings::ClientSettings;
use crate::transport::Transport;
use crate::types::{Book, BookDraft, BookId, DraftField};

/// The operation a request belongs to. Update and delete carry their id so
/// a completion never depends on issuance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Create,
    Update(BookId),
    Delete(BookId),
}

impl Operation {
    /// Log line emitted when this operation fails.
    pub fn failure_log(&self) -> &'static str {
        match self {
            Operation::Refresh => "error fetching books",
            Operation::Create => "error creating book",
            Operation::Update(_) => "error updating book",
            Operation::Delete(_) => "error deleting book",
        }
    }

    /// Alert shown to the user when this operation fails. Refresh failures
    /// are only logged.
    pub fn failure_alert(&self) -> Option<&'static str> {
        match self {
            Operation::Refresh => None,
            Operation::Create => Some("Could not create the book."),
            Operation::Update(_) => Some("Could not update the book."),
            Operation::Delete(_) => Some("Could not delete the book."),
        }
    }
}

/// A request waiting for its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub op: Operation,
    pub request: HttpRequest,
}

/// What `complete` did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub result: Result<(), ApiError>,
    /// Refresh triggered by a successful create or update.
    pub follow_up: Option<Pending>,
}

/// A user-visible error notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    fn error(message: &str) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.to_string(),
        }
    }
}

/// Draft, selection and visibility flags of the books screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub draft: BookDraft,
    pub selected: Option<Book>,
    pub modal_visible: bool,
    pub show_create_form: bool,
    pub show_update_form: bool,
}

#[derive(Debug, Clone)]
pub struct BookListClient {
    api: BooksApi,
    books: Vec<Book>,
    form: FormState,
    alerts: VecDeque<Alert>,
}

impl BookListClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_api(BooksApi::new(base_url))
    }

    /// Bind to `settings.base_url`. Pair with `UreqTransport::from_settings`
    /// for the timeout.
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(&settings.base_url)
    }

    pub fn with_api(api: BooksApi) -> Self {
        Self {
            api,
            books: Vec::new(),
            form: FormState::default(),
            alerts: VecDeque::new(),
        }
    }

    pub fn api(&self) -> &BooksApi {
        &self.api
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn draft(&self) -> &BookDraft {
        &self.form.draft
    }

    pub fn selected(&self) -> Option<&Book> {
        self.form.selected.as_ref()
    }

    // -----------------------------------------------------------------------
    // Request halves
    // -----------------------------------------------------------------------

    pub fn begin_refresh(&self) -> Pending {
        Pending {
            op: Operation::Refresh,
            request: self.api.build_list_books(),
        }
    }

    pub fn begin_create(&self, draft: &BookDraft) -> Result<Pending, ApiError> {
        Ok(Pending {
            op: Operation::Create,
            request: self.api.build_create_book(draft)?,
        })
    }

    pub fn begin_update(&self, id: &BookId, draft: &BookDraft) -> Result<Pending, ApiError> {
        Ok(Pending {
            op: Operation::Update(id.clone()),
            request: self.api.build_update_book(id, draft)?,
        })
    }

    pub fn begin_delete(&self, id: &BookId) -> Pending {
        Pending {
            op: Operation::Delete(id.clone()),
            request: self.api.build_delete_book(id),
        }
    }

    /// Create from the form draft.
    pub fn begin_submit_create(&self) -> Result<Pending, ApiError> {
        self.begin_create(&self.form.draft)
    }

    /// Update the selected book from the form draft. `None` when no book
    /// with an id is selected.
    pub fn begin_submit_update(&self) -> Option<Result<Pending, ApiError>> {
        let id = self.form.selected.as_ref()?.id.as_ref()?;
        Some(self.begin_update(id, &self.form.draft))
    }

    /// Apply the outcome of a request begun with `op`.
    ///
    /// `outcome` is the response, or the transport error when none arrived.
    /// A request that could not even be built is reported through
    /// `fail` instead.
    pub fn complete(&mut self, op: Operation, outcome: Result<HttpResponse, ApiError>) -> Completion {
        let result = match &op {
            Operation::Refresh => outcome
                .and_then(|response| self.api.parse_list_books(response))
                .map(|books| self.replace_books(books)),
            Operation::Create => outcome
                .and_then(|response| self.api.parse_create_book(response))
                .map(|()| self.form.draft = BookDraft::default()),
            Operation::Update(_) => outcome
                .and_then(|response| self.api.parse_update_book(response))
                .map(|()| {
                    self.form.draft = BookDraft::default();
                    self.form.selected = None;
                    self.form.modal_visible = false;
                    self.form.show_update_form = false;
                }),
            Operation::Delete(id) => outcome
                .and_then(|response| self.api.parse_delete_book(response))
                .map(|()| self.books.retain(|book| book.id.as_ref() != Some(id))),
        };

        match result {
            Ok(()) => {
                let follow_up = match op {
                    Operation::Create | Operation::Update(_) => Some(self.begin_refresh()),
                    Operation::Refresh | Operation::Delete(_) => None,
                };
                Completion {
                    result: Ok(()),
                    follow_up,
                }
            }
            Err(err) => {
                self.fail(&op, &err);
                Completion {
                    result: Err(err),
                    follow_up: None,
                }
            }
        }
    }

    /// Record a failure of `op`: log it and, for mutations, queue an alert.
    /// State is left untouched.
    pub fn fail(&mut self, op: &Operation, err: &ApiError) {
        tracing::error!(
            status = err.status(),
            transport = err.is_transport(),
            error = %err,
            "{}",
            op.failure_log()
        );
        if let Some(message) = op.failure_alert() {
            self.alerts.push_back(Alert::error(message));
        }
    }

    fn replace_books(&mut self, books: Vec<Book>) {
        tracing::debug!(count = books.len(), "book list replaced");
        self.books = books;
    }

    // -----------------------------------------------------------------------
    // Transport-driven operations
    // -----------------------------------------------------------------------

    /// Execute `pending` and every follow-up it triggers. Returns the result
    /// of the first request; a failed follow-up refresh is logged by
    /// `complete` and leaves the list stale.
    pub fn drive<T: Transport>(&mut self, transport: &T, pending: Pending) -> Result<(), ApiError> {
        let outcome = transport.execute(&pending.request);
        let completion = self.complete(pending.op, outcome);
        let mut next = completion.follow_up;
        while let Some(pending) = next {
            let outcome = transport.execute(&pending.request);
            next = self.complete(pending.op, outcome).follow_up;
        }
        completion.result
    }

    pub fn refresh<T: Transport>(&mut self, transport: &T) -> Result<(), ApiError> {
        let pending = self.begin_refresh();
        self.drive(transport, pending)
    }

    pub fn create<T: Transport>(&mut self, transport: &T, draft: &BookDraft) -> Result<(), ApiError> {
        let pending = self.begin_create(draft);
        self.drive_built(transport, Operation::Create, pending)
    }

    pub fn update<T: Transport>(
        &mut self,
        transport: &T,
        id: &BookId,
        draft: &BookDraft,
    ) -> Result<(), ApiError> {
        let pending = self.begin_update(id, draft);
        self.drive_built(transport, Operation::Update(id.clone()), pending)
    }

    pub fn delete<T: Transport>(&mut self, transport: &T, id: &BookId) -> Result<(), ApiError> {
        let pending = self.begin_delete(id);
        self.drive(transport, pending)
    }

    /// Create from the form draft.
    pub fn submit_create<T: Transport>(&mut self, transport: &T) -> Result<(), ApiError> {
        let draft = self.form.draft.clone();
        self.create(transport, &draft)
    }

    /// Update the selected book from the form draft. `None` when nothing
    /// with an id is selected; no request is made.
    pub fn submit_update<T: Transport>(&mut self, transport: &T) -> Option<Result<(), ApiError>> {
        let id = self.form.selected.as_ref()?.id.clone()?;
        let draft = self.form.draft.clone();
        Some(self.update(transport, &id, &draft))
    }

    fn drive_built<T: Transport>(
        &mut self,
        transport: &T,
        op: Operation,
        pending: Result<Pending, ApiError>,
    ) -> Result<(), ApiError> {
        match pending {
            Ok(pending) => self.drive(transport, pending),
            Err(err) => {
                self.fail(&op, &err);
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Form state
    // -----------------------------------------------------------------------

    pub fn set_draft_field(&mut self, field: DraftField, value: impl Into<String>) {
        self.form.draft.set(field, value);
    }

    pub fn toggle_create_form(&mut self) -> bool {
        self.form.show_create_form = !self.form.show_create_form;
        self.form.show_create_form
    }

    /// Select the book at `index` and open it in the update modal. The draft
    /// is left as it is. Returns `false` for an out-of-range index.
    pub fn open_book(&mut self, index: usize) -> bool {
        let Some(book) = self.books.get(index) else {
            return false;
        };
        self.form.selected = Some(book.clone());
        self.form.show_update_form = true;
        self.form.modal_visible = true;
        true
    }

    /// Hide the modal and both forms. The selection stays.
    pub fn close_modal(&mut self) {
        self.form.show_create_form = false;
        self.form.show_update_form = false;
        self.form.modal_visible = false;
    }

    pub fn next_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    pub fn take_alerts(&mut self) -> Vec<Alert> {
        self.alerts.drain(..).collect()
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::HttpMethod;

    /// Replays canned outcomes in order and records every request.
    #[derive(Default)]
    struct Scripted {
        outcomes: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<HttpResponse, ApiError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn methods(&self) -> Vec<HttpMethod> {
            self.seen.borrow().iter().map(|r| r.method).collect()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .expect("no scripted outcome left")
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse::new(status, body))
    }

    fn refused() -> Result<HttpResponse, ApiError> {
        Err(ApiError::Transport("connection refused".to_string()))
    }

    fn client_with(books: &str) -> BookListClient {
        let mut client = BookListClient::new("http://localhost:3000");
        let transport = Scripted::new(vec![ok(200, books)]);
        client.refresh(&transport).unwrap();
        client
    }

    #[test]
    fn from_settings_uses_configured_base_url() {
        let settings = ClientSettings {
            base_url: "http://10.0.2.2:3000/".to_string(),
            ..ClientSettings::default()
        };
        let client = BookListClient::from_settings(&settings);
        assert_eq!(client.begin_refresh().request.path, "http://10.0.2.2:3000/books");
    }

    #[test]
    fn refresh_keeps_numeric_ids_the_server_sent() {
        let client = client_with(r#"[{"id":-1,"title":"A"},{"id":2,"title":"B"}]"#);
        assert_eq!(client.books().len(), 2);
        assert_eq!(client.books()[0].list_key(0), "-1");
        let pending = client.begin_delete(client.books()[0].id.as_ref().unwrap());
        assert_eq!(pending.request.path, "http://localhost:3000/books/-1");
    }

    #[test]
    fn refresh_replaces_list_wholesale() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let transport = Scripted::new(vec![ok(200, r#"[{"id":2,"title":"B"},{"id":3,"title":"C"}]"#)]);
        client.refresh(&transport).unwrap();

        let ids: Vec<_> = client.books().iter().map(|b| b.id.clone().unwrap()).collect();
        assert_eq!(ids, vec![BookId::from(2u64), BookId::from(3u64)]);
    }

    #[test]
    fn failed_refresh_keeps_stale_list_without_alert() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let before = client.books().to_vec();

        let transport = Scripted::new(vec![ok(500, "down")]);
        assert!(client.refresh(&transport).is_err());
        let transport = Scripted::new(vec![ok(200, "garbage")]);
        assert!(matches!(
            client.refresh(&transport),
            Err(ApiError::Deserialization(_))
        ));

        assert_eq!(client.books(), before.as_slice());
        assert!(!client.has_alerts());
    }

    #[test]
    fn create_refetches_instead_of_appending() {
        let mut client = client_with("[]");
        let transport = Scripted::new(vec![
            ok(201, r#"{"id":99,"title":"ignored"}"#),
            ok(200, r#"[{"id":5,"title":"B","author":"X","genre":"Y","img":"u"}]"#),
        ]);
        client
            .create(&transport, &BookDraft::new("B", "X", "Y", "u"))
            .unwrap();

        assert_eq!(transport.methods(), vec![HttpMethod::Post, HttpMethod::Get]);
        assert_eq!(client.books().len(), 1);
        assert_eq!(client.books()[0].id, Some(BookId::from(5u64)));
    }

    #[test]
    fn create_success_resets_the_form_draft() {
        let mut client = client_with("[]");
        client.set_draft_field(DraftField::Title, "B");
        let transport = Scripted::new(vec![ok(201, ""), ok(200, "[]")]);
        client.submit_create(&transport).unwrap();
        assert!(client.draft().is_empty());
    }

    #[test]
    fn create_rejected_keeps_list_and_draft_and_alerts() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let before = client.books().to_vec();
        client.set_draft_field(DraftField::Title, "B");
        client.set_draft_field(DraftField::Author, "X");
        client.set_draft_field(DraftField::Genre, "Y");
        client.set_draft_field(DraftField::Img, "u");

        let transport = Scripted::new(vec![ok(500, "nope")]);
        let err = client.submit_create(&transport).unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.methods(), vec![HttpMethod::Post]);
        assert_eq!(client.books(), before.as_slice());
        assert_eq!(client.draft(), &BookDraft::new("B", "X", "Y", "u"));
        assert_eq!(
            client.take_alerts(),
            vec![Alert {
                title: "Error".to_string(),
                message: "Could not create the book.".to_string()
            }]
        );
    }

    #[test]
    fn create_transport_failure_alerts_the_same_way() {
        let mut client = client_with("[]");
        let transport = Scripted::new(vec![refused()]);
        let err = client
            .create(&transport, &BookDraft::new("B", "", "", ""))
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(
            client.next_alert().map(|a| a.message),
            Some("Could not create the book.".to_string())
        );
        assert!(client.next_alert().is_none());
    }

    #[test]
    fn create_still_succeeds_when_follow_up_refresh_fails() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let before = client.books().to_vec();
        let transport = Scripted::new(vec![ok(201, ""), refused()]);

        assert!(client.create(&transport, &BookDraft::default()).is_ok());
        assert_eq!(client.books(), before.as_slice());
        assert!(!client.has_alerts());
    }

    #[test]
    fn update_refetches_and_clears_form_state() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        assert!(client.open_book(0));
        client.set_draft_field(DraftField::Title, "A2");

        let transport = Scripted::new(vec![
            ok(200, "{}"),
            ok(200, r#"[{"id":1,"title":"A2","author":"","genre":"","img":""}]"#),
        ]);
        client.submit_update(&transport).unwrap().unwrap();

        let seen = transport.seen.borrow();
        assert_eq!(seen[0].method, HttpMethod::Put);
        assert_eq!(seen[0].path, "http://localhost:3000/books/1");
        assert_eq!(client.books()[0].title, "A2");
        assert_eq!(client.form(), &FormState::default());
    }

    #[test]
    fn update_failure_leaves_state_untouched() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        client.open_book(0);
        client.set_draft_field(DraftField::Title, "A2");
        let list_before = client.books().to_vec();
        let form_before = client.form().clone();

        let transport = Scripted::new(vec![ok(404, "")]);
        let result = client.submit_update(&transport).unwrap();

        assert!(result.is_err());
        assert_eq!(client.books(), list_before.as_slice());
        assert_eq!(client.form(), &form_before);
        assert_eq!(
            client.next_alert().map(|a| a.message),
            Some("Could not update the book.".to_string())
        );
    }

    #[test]
    fn submit_update_without_selection_sends_nothing() {
        let mut client = client_with(r#"[{"title":"no id"}]"#);
        let transport = Scripted::new(Vec::new());
        assert!(client.submit_update(&transport).is_none());

        client.open_book(0);
        assert!(client.submit_update(&transport).is_none());
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn delete_removes_only_the_matching_id() {
        let mut client = client_with(
            r#"[{"id":1,"title":"A"},{"id":"1","title":"text one"},{"id":2,"title":"B"}]"#,
        );
        let transport = Scripted::new(vec![ok(204, "")]);
        client.delete(&transport, &BookId::from(1u64)).unwrap();

        assert_eq!(transport.methods(), vec![HttpMethod::Delete]);
        let titles: Vec<_> = client.books().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["text one", "B"]);
    }

    #[test]
    fn delete_last_book_empties_list() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let transport = Scripted::new(vec![ok(200, "{}")]);
        client.delete(&transport, &BookId::from(1u64)).unwrap();
        assert!(client.books().is_empty());
    }

    #[test]
    fn delete_failure_keeps_list_and_alerts() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        let before = client.books().to_vec();

        let transport = Scripted::new(vec![ok(404, ""), refused()]);
        assert!(client.delete(&transport, &BookId::from(1u64)).is_err());
        assert!(client.delete(&transport, &BookId::from(1u64)).is_err());

        assert_eq!(client.books(), before.as_slice());
        let messages: Vec<_> = client.take_alerts().into_iter().map(|a| a.message).collect();
        assert_eq!(
            messages,
            vec!["Could not delete the book.", "Could not delete the book."]
        );
    }

    #[test]
    fn completions_apply_in_arrival_order() {
        let mut client = client_with(r#"[{"id":1,"title":"A"},{"id":2,"title":"B"}]"#);
        let first = client.begin_delete(&BookId::from(1u64));
        let second = client.begin_delete(&BookId::from(2u64));

        let done = client.complete(second.op, ok(204, ""));
        assert!(done.result.is_ok());
        assert!(done.follow_up.is_none());
        assert_eq!(client.books().len(), 1);

        client.complete(first.op, ok(204, ""));
        assert!(client.books().is_empty());
    }

    #[test]
    fn completed_create_hands_back_a_refresh() {
        let mut client = BookListClient::new("http://localhost:3000");
        let pending = client.begin_create(&BookDraft::default()).unwrap();
        let done = client.complete(pending.op, ok(201, ""));
        let follow_up = done.follow_up.unwrap();
        assert_eq!(follow_up.op, Operation::Refresh);
        assert_eq!(follow_up.request, client.api().build_list_books());
    }

    #[test]
    fn open_book_shows_update_modal_without_prefilling() {
        let mut client = client_with(r#"[{"id":1,"title":"A","author":"Z"}]"#);
        assert!(!client.open_book(5));
        assert!(client.open_book(0));

        let form = client.form();
        assert_eq!(form.selected.as_ref().unwrap().title, "A");
        assert!(form.modal_visible);
        assert!(form.show_update_form);
        assert!(form.draft.is_empty());
    }

    #[test]
    fn close_modal_hides_forms_but_keeps_selection() {
        let mut client = client_with(r#"[{"id":1,"title":"A"}]"#);
        client.toggle_create_form();
        client.open_book(0);
        client.close_modal();

        let form = client.form();
        assert!(!form.modal_visible);
        assert!(!form.show_create_form);
        assert!(!form.show_update_form);
        assert!(form.selected.is_some());
    }

    #[test]
    fn toggle_create_form_flips() {
        let mut client = BookListClient::new("http://localhost:3000");
        assert!(client.toggle_create_form());
        assert!(!client.toggle_create_form());
    }
}
