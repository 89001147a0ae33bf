//! Domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DbError, Row, SqlValue};

/// A persisted book record
///
/// `id` and `date_added` are assigned once at construction and never
/// change. There is no update operation anywhere in the system; a book is
/// inserted once, listed many times, and deleted at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub date_added: DateTime<Utc>,
}

impl Book {
    /// Build a record from an extracted candidate pair
    ///
    /// Returns `None` unless both title and author are non-empty after
    /// trimming; callers drop such candidates from the save set. A fresh id
    /// and the current time are assigned here, before insertion, so the
    /// record reported to the client is exactly the row that was stored.
    pub fn from_candidate(title: Option<&str>, author: Option<&str>) -> Option<Self> {
        let title = title.unwrap_or("").trim();
        let author = author.unwrap_or("").trim();

        if title.is_empty() || author.is_empty() {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
            date_added: Utc::now(),
        })
    }

    /// Decode a record from an adapter result row
    pub fn from_row(row: &Row) -> Result<Self, DbError> {
        let id = row
            .get("id")
            .and_then(SqlValue::try_uuid)
            .ok_or_else(|| DbError::Decode("books.id is not a valid UUID".to_string()))?;

        let title = row
            .get("title")
            .and_then(SqlValue::as_text)
            .ok_or_else(|| DbError::Decode("books.title is not text".to_string()))?
            .to_string();

        let author = row
            .get("author")
            .and_then(SqlValue::as_text)
            .ok_or_else(|| DbError::Decode("books.author is not text".to_string()))?
            .to_string();

        let date_added = row
            .get("date_added")
            .and_then(SqlValue::try_timestamp)
            .ok_or_else(|| DbError::Decode("books.date_added is not a timestamp".to_string()))?;

        Ok(Self {
            id,
            title,
            author,
            date_added,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_candidate_valid() {
        let book = Book::from_candidate(Some("Dune"), Some("Herbert")).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
    }

    #[test]
    fn test_from_candidate_trims_whitespace() {
        let book = Book::from_candidate(Some("  Dune "), Some("\tHerbert\n")).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
    }

    #[test]
    fn test_from_candidate_missing_or_blank_fields_rejected() {
        assert!(Book::from_candidate(None, Some("Herbert")).is_none());
        assert!(Book::from_candidate(Some("Dune"), None).is_none());
        assert!(Book::from_candidate(Some("   "), Some("Herbert")).is_none());
        assert!(Book::from_candidate(Some("Dune"), Some("")).is_none());
        assert!(Book::from_candidate(None, None).is_none());
    }

    #[test]
    fn test_from_candidate_timestamp_not_before_call_start() {
        let start = Utc::now();
        let book = Book::from_candidate(Some("Dune"), Some("Herbert")).unwrap();
        let end = Utc::now();
        assert!(book.date_added >= start);
        assert!(book.date_added <= end);
    }

    #[test]
    fn test_from_candidate_assigns_fresh_ids() {
        let a = Book::from_candidate(Some("Dune"), Some("Herbert")).unwrap();
        let b = Book::from_candidate(Some("Dune"), Some("Herbert")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_from_row_roundtrip() {
        let id = Uuid::new_v4();
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Text(id.to_string())),
            ("title".to_string(), SqlValue::Text("Dune".to_string())),
            ("author".to_string(), SqlValue::Text("Herbert".to_string())),
            (
                "date_added".to_string(),
                SqlValue::Text("2024-06-01T12:30:00.000000Z".to_string()),
            ),
        ]);

        let book = Book::from_row(&row).unwrap();
        assert_eq!(book.id, id);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
    }

    #[test]
    fn test_from_row_rejects_bad_id() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Text("garbage".to_string())),
            ("title".to_string(), SqlValue::Text("Dune".to_string())),
            ("author".to_string(), SqlValue::Text("Herbert".to_string())),
            ("date_added".to_string(), SqlValue::Null),
        ]);

        assert!(matches!(Book::from_row(&row), Err(DbError::Decode(_))));
    }

    #[test]
    fn test_serializes_with_camel_case_date_field() {
        let book = Book::from_candidate(Some("Dune"), Some("Herbert")).unwrap();
        let json = serde_json::to_value(&book).unwrap();
        assert!(json.get("dateAdded").is_some());
        assert!(json.get("date_added").is_none());
    }
}
