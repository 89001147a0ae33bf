//! Bookscan Server Library
//!
//! HTTP service that turns bookshelf photos into a persisted book
//! collection.
//!
//! # Overview
//!
//! - **API Endpoints**: scan an image, list books, delete a book
//! - **Database Adapter**: one query/execute/close contract over an
//!   embedded SQLite file or a networked PostgreSQL database, selected at
//!   startup
//! - **Vision Client**: pass-through to an external multimodal completion
//!   API, with structured-array extraction from free-text replies
//! - **Configuration**: environment-based with validation
//!
//! # Architecture
//!
//! Features are vertical slices: commands are write operations (scan,
//! delete), queries are read operations (list), and routes wire them to
//! axum handlers. The database adapter is constructed once in `main` and
//! passed into the feature state; nothing else owns a connection.
//!
//! # Example
//!
//! ```no_run
//! use bookscan_server::{api, config::Config, db::Db, features::FeatureState, vision::VisionClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let db = Db::connect(&config.database).await?;
//!     let vision = VisionClient::new(config.vision.clone())?;
//!     let state = FeatureState {
//!         db,
//!         vision,
//!         verbose_errors: !config.environment.is_production(),
//!     };
//!     let app = api::router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod middleware;
pub mod models;
pub mod vision;
