//! Shelf scan ingestion pipeline
//!
//! Image bytes in, persisted book records out: extract candidates via the
//! vision client, validate each pair, insert the valid ones one at a time,
//! and report the saved set.
//!
//! Candidates missing a title or author after trimming are dropped from the
//! save set without raising; only a count is logged. Per-record persistence
//! failures are also skip-and-continue: no transaction spans the batch, so
//! aborting midway would leave earlier inserts in place anyway, and partial
//! success is still success to the client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Db;
use crate::models::Book;
use crate::vision::{VisionClient, VisionError};

/// Maximum accepted image size
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted upload MIME types
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

const INSERT_BOOK: &str =
    "INSERT INTO books (id, title, author, date_added) VALUES (?, ?, ?, ?)";

#[derive(Debug, Clone)]
pub struct ScanShelfCommand {
    /// Raw image bytes from the multipart upload
    pub image: Vec<u8>,
    /// MIME type reported for the uploaded file
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanShelfResponse {
    /// Successfully persisted records, in insertion order
    pub books: Vec<Book>,
}

#[derive(Debug, Error)]
pub enum ScanShelfError {
    #[error("No image file provided")]
    ImageRequired,

    #[error("File type '{0}' not supported. Please upload a JPG or PNG image.")]
    UnsupportedType(String),

    #[error("File too large ({size} bytes). Maximum size is 5MB.")]
    ImageTooLarge { size: usize },

    /// The upload was cut off at the transport body limit before its full
    /// size was known
    #[error("File too large. Maximum size is 5MB.")]
    BodyTooLarge,

    #[error("Exactly one image file must be uploaded")]
    MultipleFiles,

    #[error("Malformed multipart upload: {0}")]
    Multipart(String),

    #[error(transparent)]
    Vision(#[from] VisionError),
}

impl ScanShelfCommand {
    pub fn validate(&self) -> Result<(), ScanShelfError> {
        if self.image.is_empty() {
            return Err(ScanShelfError::ImageRequired);
        }

        let content_type = self.content_type.as_deref().unwrap_or("");
        if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
            return Err(ScanShelfError::UnsupportedType(
                if content_type.is_empty() { "unknown" } else { content_type }.to_string(),
            ));
        }

        if self.image.len() > MAX_IMAGE_BYTES {
            return Err(ScanShelfError::ImageTooLarge {
                size: self.image.len(),
            });
        }

        Ok(())
    }
}

#[tracing::instrument(skip(db, vision, command), fields(image_bytes = command.image.len()))]
pub async fn handle(
    db: &Db,
    vision: &VisionClient,
    command: ScanShelfCommand,
) -> Result<ScanShelfResponse, ScanShelfError> {
    command.validate()?;

    let content_type = command.content_type.as_deref().unwrap_or("image/jpeg");
    let candidates = vision.detect(&command.image, content_type).await?;

    tracing::info!(candidates = candidates.len(), "Vision extraction complete");

    let mut books = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for candidate in &candidates {
        let Some(book) =
            Book::from_candidate(candidate.title.as_deref(), candidate.author.as_deref())
        else {
            dropped += 1;
            continue;
        };

        let result = db
            .execute(
                INSERT_BOOK,
                &[
                    book.id.into(),
                    book.title.clone().into(),
                    book.author.clone().into(),
                    book.date_added.into(),
                ],
            )
            .await;

        match result {
            Ok(_) => books.push(book),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    title = %book.title,
                    "Failed to persist detected book, skipping"
                );
            },
        }
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            saved = books.len(),
            "Candidates without both title and author were dropped"
        );
    }

    tracing::info!(saved = books.len(), "Shelf scan complete");

    Ok(ScanShelfResponse { books })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(image: Vec<u8>, content_type: &str) -> ScanShelfCommand {
        ScanShelfCommand {
            image,
            content_type: Some(content_type.to_string()),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command(vec![0xFF, 0xD8, 0xFF], "image/jpeg").validate().is_ok());
        assert!(command(vec![0x89, 0x50], "image/png").validate().is_ok());
    }

    #[test]
    fn test_validation_empty_image() {
        let cmd = command(vec![], "image/jpeg");
        assert!(matches!(cmd.validate(), Err(ScanShelfError::ImageRequired)));
    }

    #[test]
    fn test_validation_unsupported_type() {
        let cmd = command(vec![1, 2, 3], "image/gif");
        assert!(matches!(
            cmd.validate(),
            Err(ScanShelfError::UnsupportedType(t)) if t == "image/gif"
        ));
    }

    #[test]
    fn test_validation_missing_type() {
        let cmd = ScanShelfCommand {
            image: vec![1, 2, 3],
            content_type: None,
        };
        assert!(matches!(
            cmd.validate(),
            Err(ScanShelfError::UnsupportedType(t)) if t == "unknown"
        ));
    }

    #[test]
    fn test_validation_oversized_image() {
        let cmd = command(vec![0u8; MAX_IMAGE_BYTES + 1], "image/jpeg");
        assert!(matches!(
            cmd.validate(),
            Err(ScanShelfError::ImageTooLarge { size }) if size == MAX_IMAGE_BYTES + 1
        ));
    }

    #[test]
    fn test_validation_at_size_limit_accepted() {
        let cmd = command(vec![0u8; MAX_IMAGE_BYTES], "image/jpeg");
        assert!(cmd.validate().is_ok());
    }
}
