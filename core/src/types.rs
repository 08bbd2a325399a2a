//! Domain types for the books API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently, and
//! are deliberately looser: the server decides what an id looks like, so
//! `BookId` accepts either a JSON number or a JSON string, and every text
//! field defaults to empty when absent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier. The client never creates one.
///
/// Numbers are kept as `serde_json::Number`, so negative, fractional and
/// oversized ids render back exactly as the server sent them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Number(serde_json::Number),
    Text(String),
}

impl BookId {
    /// Read an id that arrived as text (from a C caller, a URL segment).
    /// It is a number only if it is already in canonical JSON number form,
    /// so `"7"` is a number but `"007"` and `"+5"` stay text.
    pub fn parse_lossless(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Number>(raw) {
            Ok(n) if n.to_string() == raw => BookId::Number(n),
            _ => BookId::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookId::Number(n) => write!(f, "{n}"),
            BookId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for BookId {
    fn from(n: u64) -> Self {
        BookId::Number(n.into())
    }
}

impl From<serde_json::Number> for BookId {
    fn from(n: serde_json::Number) -> Self {
        BookId::Number(n)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        BookId::Text(s.to_string())
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        BookId::Text(s)
    }
}

/// A book as listed by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    /// Image URI, passed through unvalidated.
    #[serde(default)]
    pub img: String,
}

impl Book {
    /// Stable row key for list rendering: the id, or `row-{index}` when the
    /// server sent a book without one.
    pub fn list_key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("row-{index}"),
        }
    }

    /// The editable fields of this book, without its id.
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            img: self.img.clone(),
        }
    }
}

/// Field values of a create or update form. Carries no id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub img: String,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        img: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            img: img.into(),
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Title => &mut self.title,
            DraftField::Author => &mut self.author,
            DraftField::Genre => &mut self.genre,
            DraftField::Img => &mut self.img,
        };
        *slot = value.into();
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Author => &self.author,
            DraftField::Genre => &self.genre,
            DraftField::Img => &self.img,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &BookDraft::default()
    }
}

/// One editable field of a `BookDraft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Author,
    Genre,
    Img,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_accepts_number_or_string() {
        let n: BookId = serde_json::from_str("1").unwrap();
        let s: BookId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(n, BookId::from(1u64));
        assert_eq!(s, BookId::Text("abc".to_string()));
        assert_eq!(n.to_string(), "1");
        assert_eq!(s.to_string(), "abc");
    }

    #[test]
    fn parse_lossless_keeps_non_canonical_numbers_as_text() {
        assert_eq!(BookId::parse_lossless("7"), BookId::from(7u64));
        assert_eq!(BookId::parse_lossless("-1").to_string(), "-1");
        assert!(matches!(BookId::parse_lossless("-1"), BookId::Number(_)));
        assert_eq!(BookId::parse_lossless("007"), BookId::from("007"));
        assert_eq!(BookId::parse_lossless("+5"), BookId::from("+5"));
        assert_eq!(BookId::parse_lossless("1e3"), BookId::from("1e3"));
        assert_eq!(BookId::parse_lossless("abc"), BookId::from("abc"));
    }

    #[test]
    fn book_decodes_with_missing_fields() {
        let book: Book = serde_json::from_str(r#"{"id":1,"title":"A"}"#).unwrap();
        assert_eq!(book.id, Some(BookId::from(1u64)));
        assert_eq!(book.title, "A");
        assert!(book.author.is_empty());
        assert!(book.img.is_empty());
    }

    #[test]
    fn book_without_id_gets_positional_key() {
        let book: Book = serde_json::from_str(r#"{"title":"No id"}"#).unwrap();
        assert_eq!(book.id, None);
        assert_eq!(book.list_key(3), "row-3");
    }

    #[test]
    fn book_with_id_keys_by_id() {
        let book = Book {
            id: Some("x-9".into()),
            ..Book::default()
        };
        assert_eq!(book.list_key(0), "x-9");
    }

    #[test]
    fn draft_serializes_without_id() {
        let draft = BookDraft::new("B", "X", "Y", "u");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title":"B","author":"X","genre":"Y","img":"u"})
        );
    }

    #[test]
    fn draft_set_and_get_address_the_same_field() {
        let mut draft = BookDraft::default();
        assert!(draft.is_empty());
        draft.set(DraftField::Genre, "Poetry");
        assert_eq!(draft.get(DraftField::Genre), "Poetry");
        assert_eq!(draft.genre, "Poetry");
        assert!(!draft.is_empty());
    }
}
