//! Book API routes
//!
//! - `GET /api/books` - List all books, newest first
//! - `POST /api/scan` - Scan an uploaded bookshelf photo into records
//! - `DELETE /api/books/:id` - Delete a book by id (idempotent)

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::response::ErrorResponse;
use crate::features::FeatureState;
use crate::models::Book;
use crate::vision::VisionError;

use super::commands::{
    self, DeleteBookCommand, DeleteBookError, ScanShelfCommand, ScanShelfError,
};
use super::queries;

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the books router with all routes configured
pub fn books_routes() -> Router<FeatureState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/:id", delete(delete_book))
        .route("/scan", post(scan_shelf))
}

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Serialize)]
struct ScanResponseBody {
    success: bool,
    books: Vec<Book>,
}

#[derive(Debug, Serialize)]
struct DeleteResponseBody {
    success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// List all books
///
/// `GET /api/books` returns a bare JSON array ordered by `dateAdded`
/// descending.
#[tracing::instrument(skip(state))]
async fn list_books(State(state): State<FeatureState>) -> Response {
    match queries::list::handle(&state.db).await {
        Ok(books) => (StatusCode::OK, Json(books)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to list books");
            ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching books")
                .with_details_if(state.verbose_errors, err.to_string())
                .into_response()
        },
    }
}

/// Scan an uploaded bookshelf photo
///
/// `POST /api/scan` with a multipart body containing exactly one `image`
/// file (jpeg/png, at most 5MB). Responds 200 with the persisted records on
/// full or partial success; zero extracted books is still success with an
/// empty array.
#[tracing::instrument(skip(state, multipart))]
async fn scan_shelf(State(state): State<FeatureState>, multipart: Multipart) -> Response {
    let command = match read_image_upload(multipart).await {
        Ok(command) => command,
        Err(err) => return scan_error(err, state.verbose_errors),
    };

    match commands::scan::handle(&state.db, &state.vision, command).await {
        Ok(response) => {
            tracing::info!(saved = response.books.len(), "Shelf scanned via API");
            (
                StatusCode::OK,
                Json(ScanResponseBody {
                    success: true,
                    books: response.books,
                }),
            )
                .into_response()
        },
        Err(err) => scan_error(err, state.verbose_errors),
    }
}

/// Delete a book by id
///
/// `DELETE /api/books/:id` succeeds even when the id does not exist.
#[tracing::instrument(skip(state))]
async fn delete_book(State(state): State<FeatureState>, Path(id): Path<String>) -> Response {
    match commands::delete::handle(&state.db, DeleteBookCommand { id }).await {
        Ok(response) => {
            tracing::info!(
                book_id = %response.id,
                deleted = response.deleted,
                "Book deleted via API"
            );
            (StatusCode::OK, Json(DeleteResponseBody { success: true })).into_response()
        },
        Err(err) => delete_error(err, state.verbose_errors),
    }
}

// ============================================================================
// Multipart Extraction
// ============================================================================

/// Pull the single `image` file out of the multipart body
async fn read_image_upload(mut multipart: Multipart) -> Result<ScanShelfCommand, ScanShelfError> {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }

        if upload.is_some() {
            return Err(ScanShelfError::MultipleFiles);
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((data.to_vec(), content_type));
    }

    let (image, content_type) = upload.ok_or(ScanShelfError::ImageRequired)?;

    Ok(ScanShelfCommand {
        image,
        content_type,
    })
}

/// Uploads larger than the transport body limit surface here as a cut-off
/// read rather than reaching size validation; both get the same answer.
fn multipart_error(err: MultipartError) -> ScanShelfError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ScanShelfError::BodyTooLarge
    } else {
        ScanShelfError::Multipart(err.body_text())
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

fn scan_error(err: ScanShelfError, verbose: bool) -> Response {
    match &err {
        ScanShelfError::ImageRequired
        | ScanShelfError::UnsupportedType(_)
        | ScanShelfError::ImageTooLarge { .. }
        | ScanShelfError::BodyTooLarge
        | ScanShelfError::MultipleFiles
        | ScanShelfError::Multipart(_) => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, "Validation error")
                .with_details(err.to_string())
                .into_response()
        },
        ScanShelfError::Vision(vision_err) => {
            tracing::error!(error = %err, "Vision extraction failed");
            if let VisionError::Extraction { raw } = vision_err {
                tracing::debug!(raw_len = raw.len(), "Unparseable vision response retained");
            }
            ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Error processing image")
                .retryable(vision_err.is_retryable())
                .with_details_if(verbose, err.to_string())
                .into_response()
        },
    }
}

fn delete_error(err: DeleteBookError, verbose: bool) -> Response {
    match &err {
        DeleteBookError::IdRequired | DeleteBookError::InvalidId => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, "Validation error")
                .with_details(err.to_string())
                .into_response()
        },
        DeleteBookError::Database(_) => {
            tracing::error!(error = %err, "Failed to delete book");
            ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Error deleting book")
                .with_details_if(verbose, err.to_string())
                .into_response()
        },
    }
}
