//! List all books, newest first

use thiserror::Error;

use crate::db::{Db, DbError};
use crate::models::Book;

const LIST_BOOKS: &str =
    "SELECT id, title, author, date_added FROM books ORDER BY date_added DESC";

#[derive(Debug, Error)]
pub enum ListBooksError {
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Fetch every book ordered by `date_added` descending. No pagination; the
/// collection is a personal shelf, not a catalog.
#[tracing::instrument(skip(db))]
pub async fn handle(db: &Db) -> Result<Vec<Book>, ListBooksError> {
    let rows = db.query(LIST_BOOKS, &[]).await?;

    let books = rows
        .iter()
        .map(Book::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = books.len(), "Books listed");

    Ok(books)
}
