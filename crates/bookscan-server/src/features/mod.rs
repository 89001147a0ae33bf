//! Feature modules implementing the bookscan API
//!
//! One vertical slice per resource, each with its own commands (write
//! operations), queries (read operations), and routes. There is exactly one
//! resource in this system, so there is exactly one slice.

pub mod books;

use axum::Router;

use crate::db::Db;
use crate::vision::VisionClient;

/// Shared state for all feature routes
///
/// Holds the database adapter and the vision client. Both are cheap to
/// clone; the adapter exclusively owns the live backend connections and
/// handlers never touch a backend directly.
#[derive(Clone)]
pub struct FeatureState {
    pub db: Db,
    pub vision: VisionClient,
    /// Include internal error details in responses (development mode)
    pub verbose_errors: bool,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    books::books_routes().with_state(state)
}
