//! Common utilities and shared types for Noxa.
//!
//! This crate provides foundational components used across all Noxa crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Slugs**: URL-safe identifiers derived from usernames
//! - **Storage**: File storage for uploaded PDFs and profile photos
//!
//! # Example
//!
//! ```no_run
//! use noxa_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod slug;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use slug::{slug_with_suffix, slugify};
pub use storage::{
    IncomingFile, LocalStorage, PDF_PREFIX, PHOTO_PREFIX, StorageBackend, has_pdf_extension,
    sanitize_filename, storage_key,
};
