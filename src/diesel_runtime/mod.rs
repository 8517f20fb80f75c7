//! Diesel ORM runtime infrastructure
//!
//! Postgres connection pooling plus the raw row source and record sink that
//! let the extraction runtime work directly against the raw and tool-layer
//! tables.

pub mod database;
pub mod models;
pub mod schema;
pub mod store;

// Re-export key types
pub use database::{Database, DatabaseConfig, Pool, PooledConnection};
pub use store::{DieselRawSource, DieselRecordSink};
