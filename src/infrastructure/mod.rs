// Core infrastructure modules
pub mod database;              // Store interface and the Postgres backend
pub mod sqlite_database;       // SQLite backend (tests and local runs)
pub mod id_generator;          // ID generation system
pub mod viewer;                // Viewer context
pub mod middleware;            // Viewer context middleware and extractor

// Re-export core infrastructure components
pub use database::{connect_database, DatabaseInterface, FollowDirection, PostgresDatabase};
pub use id_generator::IdGenerator;
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;
