// Echoed - threaded comments and an idempotent follow graph

// Configuration and application wiring
pub mod config;
pub mod app_state;

// HTTP surface
pub mod echoed_interface;

// Core types and primitives
pub mod core;

// Store backends, ids, viewer context
pub mod infrastructure;

// Domain-Driven Organization - services organized by domain
pub mod domains;

// Common utilities
pub mod error;

// Json/Path/Query extractors that reject with the error envelope
pub mod extract;

// Re-exports for convenience
pub use error::{AppError, AppResult};
