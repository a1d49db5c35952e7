//! Datadrop Core Library
//!
//! Shared building blocks for the Datadrop server: configuration, the
//! unified error taxonomy, share identifiers, domain models, and input
//! validation helpers.

pub mod config;
pub mod error;
pub mod models;
pub mod share_id;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ShareEntry, ShareResponse};
pub use share_id::ShareId;
