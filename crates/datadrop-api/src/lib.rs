//! Datadrop API Library
//!
//! This crate provides the HTTP transfer handlers, the reaper background
//! service, and application setup for the Datadrop server.

// Module declarations
mod api_doc;

// Public modules
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::ErrorResponse;
pub use services::reaper::Reaper;
