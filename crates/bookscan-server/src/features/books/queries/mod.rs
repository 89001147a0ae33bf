//! Read operations for the books slice

pub mod list;

pub use list::ListBooksError;
