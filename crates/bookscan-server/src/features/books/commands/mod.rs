//! Write operations for the books slice

pub mod delete;
pub mod scan;

pub use delete::{DeleteBookCommand, DeleteBookError, DeleteBookResponse};
pub use scan::{ScanShelfCommand, ScanShelfError, ScanShelfResponse};
