//! Books feature slice
//!
//! Scanning a bookshelf photo into persisted records, listing them, and
//! deleting them by id.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::books_routes;
