//! Backend-agnostic query values and result rows
//!
//! The two storage engines return differently shaped result sets and accept
//! differently typed parameters. `SqlValue` is the single value type that
//! crosses the adapter boundary in both directions; `Row` is the ordered
//! column mapping a query returns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A typed SQL parameter or result value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Borrow the value as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret the value as a UUID
    ///
    /// The networked backend stores ids natively; the embedded backend
    /// stores them as text. Both decode here.
    pub fn try_uuid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Uuid(u) => Some(*u),
            SqlValue::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    /// Interpret the value as a UTC timestamp
    ///
    /// Accepts native timestamps (networked backend) and RFC 3339 text
    /// (embedded backend).
    pub fn try_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            SqlValue::Timestamp(t) => Some(*t),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<Uuid> for SqlValue {
    fn from(u: Uuid) -> Self {
        SqlValue::Uuid(u)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(t: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(t)
    }
}

/// One result row: column names with their decoded values, in select order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub(crate) fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Look up a column by name
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_uuid_from_text_and_native() {
        let id = Uuid::new_v4();
        assert_eq!(SqlValue::Uuid(id).try_uuid(), Some(id));
        assert_eq!(SqlValue::Text(id.to_string()).try_uuid(), Some(id));
        assert_eq!(SqlValue::Text("not-a-uuid".to_string()).try_uuid(), None);
        assert_eq!(SqlValue::Integer(7).try_uuid(), None);
    }

    #[test]
    fn test_try_timestamp_from_text_and_native() {
        let now = Utc::now();
        assert_eq!(SqlValue::Timestamp(now).try_timestamp(), Some(now));

        let parsed = SqlValue::Text("2024-06-01T12:30:00.000000Z".to_string())
            .try_timestamp()
            .unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-06-01T12:30:00+00:00");

        assert_eq!(SqlValue::Text("yesterday".to_string()).try_timestamp(), None);
    }

    #[test]
    fn test_row_lookup() {
        let row = Row::new(vec![
            ("title".to_string(), SqlValue::Text("Dune".to_string())),
            ("author".to_string(), SqlValue::Text("Herbert".to_string())),
        ]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("title").and_then(SqlValue::as_text), Some("Dune"));
        assert_eq!(row.get("missing"), None);
    }
}
