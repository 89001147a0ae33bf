//! Delete a book by id
//!
//! Deletion is idempotent: removing an id that does not exist succeeds with
//! zero affected rows. Only the id format is validated.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Db, DbError};

const DELETE_BOOK: &str = "DELETE FROM books WHERE id = ?";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookCommand {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookResponse {
    pub id: Uuid,
    /// Affected-row count; zero when the id was not present
    pub deleted: u64,
}

#[derive(Debug, Error)]
pub enum DeleteBookError {
    #[error("Book ID is required")]
    IdRequired,

    #[error("Invalid book ID format")]
    InvalidId,

    #[error(transparent)]
    Database(#[from] DbError),
}

impl DeleteBookCommand {
    /// Validate the id and parse it into its canonical form
    pub fn validate(&self) -> Result<Uuid, DeleteBookError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(DeleteBookError::IdRequired);
        }
        Uuid::parse_str(id).map_err(|_| DeleteBookError::InvalidId)
    }
}

#[tracing::instrument(skip(db, command), fields(id = %command.id))]
pub async fn handle(
    db: &Db,
    command: DeleteBookCommand,
) -> Result<DeleteBookResponse, DeleteBookError> {
    let id = command.validate()?;

    let deleted = db.execute(DELETE_BOOK, &[id.into()]).await?;

    if deleted == 0 {
        tracing::debug!(book_id = %id, "No matching book; delete is idempotent");
    }

    Ok(DeleteBookResponse { id, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_success() {
        let id = Uuid::new_v4();
        let cmd = DeleteBookCommand { id: id.to_string() };
        assert_eq!(cmd.validate().unwrap(), id);
    }

    #[test]
    fn test_validation_trims_whitespace() {
        let id = Uuid::new_v4();
        let cmd = DeleteBookCommand {
            id: format!("  {}  ", id),
        };
        assert_eq!(cmd.validate().unwrap(), id);
    }

    #[test]
    fn test_validation_empty_id() {
        let cmd = DeleteBookCommand { id: "   ".to_string() };
        assert!(matches!(cmd.validate(), Err(DeleteBookError::IdRequired)));
    }

    #[test]
    fn test_validation_malformed_id() {
        let cmd = DeleteBookCommand {
            id: "not-a-uuid".to_string(),
        };
        assert!(matches!(cmd.validate(), Err(DeleteBookError::InvalidId)));
    }
}
