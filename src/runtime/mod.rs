//! Generic runtime that drives row extractors over stored raw data.
//!
//! Raw rows are paged out of a [`RawRowSource`] and handed to a
//! [`RowExtractor`]; the resulting records are routed into a [`RecordSink`].

pub mod api_extractor;
pub mod config_loader;
pub mod raw_data;
pub mod sink;
pub mod subtask;

// Re-export key types
pub use api_extractor::{ApiExtractor, ExtractionReport, OnRowError, RowExtractor, RowFailure, RunnerOptions};
pub use config_loader::ExtractorConfig;
pub use raw_data::{RawDataSubTaskArgs, RawRow};
pub use sink::{MemoryRawSource, MemorySink, RawRowSource, RecordSink, WriterSink};
pub use subtask::{DomainType, SubTaskMeta};
