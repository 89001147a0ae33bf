//! Bookscan Common Library
//!
//! Shared infrastructure for the bookscan workspace.
//!
//! # Overview
//!
//! Currently this crate carries the logging subsystem used by the server
//! binary and its integration tests. Domain types live in the server crate;
//! anything that a second binary (e.g. a future import CLI) would need ends
//! up here.
//!
//! # Example
//!
//! ```no_run
//! use bookscan_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod logging;

// Re-export commonly used types
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput};
