//! # Buildnom: Jenkins Build Extraction
//!
//! Buildnom turns previously collected Jenkins API payloads into normalized
//! build and commit records, ready to be loaded into a tool-layer schema.
//!
//! ## Features
//!
//! - **Pure per-row transform**: [`extract_build`] maps one raw payload and its job
//!   context to exactly one [`Build`] plus zero or more [`BuildCommit`]s, with no side
//!   effects, so rows can be replayed safely
//! - **Lenient decoding**: missing or `null` upstream fields fall back to zero values
//! - **Extraction runtime**: [`ApiExtractor`] pages raw rows, extracts them on a worker
//!   pool, stamps lineage and saves records in batches
//! - **Postgres storage**: Diesel-backed raw row source and record sink (feature: `postgres`)
//!
//! ## Example
//!
//! ```
//! use buildnom::extract_build;
//!
//! let data = br#"{
//!     "_class": "hudson.model.FreeStyleBuild",
//!     "fullDisplayName": "deploy #12",
//!     "number": 12,
//!     "timestamp": 1700000000123,
//!     "changeSet": {"kind": "svn", "revisions": [{"revision": 4521}]}
//! }"#;
//! let input = br#"{"name": "deploy"}"#;
//!
//! let extracted = extract_build(1, data, input).unwrap();
//! assert_eq!(extracted.build.class, "FreeStyleBuild");
//! assert_eq!(extracted.build.commit_sha, "4521");
//! assert!(extracted.commits.is_empty());
//! ```

// Core modules
pub mod entity;
pub mod error;
pub mod registry;
pub mod serialization;

// Jenkins build extraction
pub mod jenkins;

// Generic runtime driving extractors over raw data
pub mod runtime;

// Diesel ORM runtime infrastructure
#[cfg(feature = "postgres")]
pub mod diesel_runtime;

// Re-export key types
pub use entity::{Entity, RawDataOrigin, Record};
pub use error::{DecodeStage, ExtractError, RunnerError, SerializationError};
pub use registry::{RegisteredTask, RegistryError, TaskRegistry};
pub use serialization::{write_records, JsonArrayWriter, NdjsonWriter, RecordFormat};

pub use jenkins::{
    extract_build, Build, BuildCommit, BuildExtractor, ExtractedBuild, JenkinsApiParams,
    RAW_BUILD_TABLE,
};

pub use runtime::{
    ApiExtractor, DomainType, ExtractionReport, ExtractorConfig, MemoryRawSource, MemorySink,
    OnRowError, RawDataSubTaskArgs, RawRow, RawRowSource, RecordSink, RowExtractor, RowFailure,
    RunnerOptions, SubTaskMeta, WriterSink,
};

#[cfg(feature = "postgres")]
pub use diesel_runtime::{Database, DatabaseConfig, DieselRawSource, DieselRecordSink};
