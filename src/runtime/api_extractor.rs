//! Runner that drives a row extractor over a raw table.
//!
//! One pass of [`ApiExtractor::execute`]:
//! 1. removes records left by previous passes over the same table and params
//! 2. pages raw rows out of the source in ascending id order
//! 3. extracts each page on a worker pool, keeping row order
//! 4. stamps lineage onto the records and saves them in batches
//!
//! A failing row never persists anything. Whether the pass continues past it
//! is decided by [`OnRowError`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::entity::Record;
use crate::error::{DecodeStage, ExtractError, RunnerError};
use crate::runtime::config_loader::ExtractorConfig;
use crate::runtime::raw_data::{RawDataSubTaskArgs, RawRow};
use crate::runtime::sink::{RawRowSource, RecordSink};

/// Per-row transform from a raw row into records.
///
/// Implementations must be pure: the runner may call them concurrently and
/// may replay the same row in later passes.
pub trait RowExtractor: Send + Sync {
    fn extract(&self, row: &RawRow) -> Result<Vec<Record>, ExtractError>;
}

impl<F> RowExtractor for F
where
    F: Fn(&RawRow) -> Result<Vec<Record>, ExtractError> + Send + Sync,
{
    fn extract(&self, row: &RawRow) -> Result<Vec<Record>, ExtractError> {
        self(row)
    }
}

/// What the runner does when a row fails to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRowError {
    /// Log the failure, report it, and continue with the next row
    #[default]
    Skip,
    /// Persist the rows extracted so far and stop the pass
    Abort,
}

impl FromStr for OnRowError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(OnRowError::Skip),
            "abort" => Ok(OnRowError::Abort),
            other => Err(format!("Unsupported row error policy: '{}'. Supported: skip, abort", other)),
        }
    }
}

/// Tuning knobs of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Rows fetched per page, and records buffered per save
    pub batch_size: usize,
    /// Worker threads; 0 lets rayon pick
    pub workers: usize,
    pub on_row_error: OnRowError,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            workers: 0,
            on_row_error: OnRowError::Skip,
        }
    }
}

impl From<&ExtractorConfig> for RunnerOptions {
    fn from(config: &ExtractorConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            workers: config.workers,
            on_row_error: config.on_row_error,
        }
    }
}

/// A row that produced no records because it failed to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row_id: u64,
    pub stage: String,
    pub message: String,
}

impl RowFailure {
    fn new(row_id: u64, err: &ExtractError) -> Self {
        Self {
            row_id,
            stage: err.stage().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_stage(&self, stage: DecodeStage) -> bool {
        self.stage == stage.to_string()
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub run_id: Uuid,
    pub table: String,
    pub params: String,
    /// Records removed before extraction started
    pub deleted: usize,
    pub rows_processed: usize,
    pub builds: usize,
    pub build_commits: usize,
    pub failures: Vec<RowFailure>,
}

impl ExtractionReport {
    fn new(run_id: Uuid, args: &RawDataSubTaskArgs) -> Self {
        Self {
            run_id,
            table: args.table.clone(),
            params: args.params_key(),
            deleted: 0,
            rows_processed: 0,
            builds: 0,
            build_commits: 0,
            failures: Vec::new(),
        }
    }

    pub fn records(&self) -> usize {
        self.builds + self.build_commits
    }

    fn count(&mut self, record: &Record) {
        match record {
            Record::Build(_) => self.builds += 1,
            Record::BuildCommit(_) => self.build_commits += 1,
        }
    }
}

/// Drives a [`RowExtractor`] over the raw rows selected by
/// [`RawDataSubTaskArgs`].
pub struct ApiExtractor<'a> {
    args: RawDataSubTaskArgs,
    extractor: &'a dyn RowExtractor,
    options: RunnerOptions,
}

impl<'a> ApiExtractor<'a> {
    pub fn new(
        args: RawDataSubTaskArgs,
        extractor: &'a dyn RowExtractor,
        options: RunnerOptions,
    ) -> Result<Self, RunnerError> {
        if options.batch_size == 0 {
            return Err(RunnerError::Config("batch_size must be greater than 0".to_string()));
        }
        Ok(Self {
            args,
            extractor,
            options,
        })
    }

    pub fn args(&self) -> &RawDataSubTaskArgs {
        &self.args
    }

    /// Run one extraction pass from `source` into `sink`.
    pub fn execute(
        &self,
        source: &mut dyn RawRowSource,
        sink: &mut dyn RecordSink,
    ) -> Result<ExtractionReport, RunnerError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("extract", %run_id, table = %self.args.table);
        let _guard = span.enter();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
            .map_err(|e| RunnerError::WorkerPool(e.to_string()))?;

        let mut report = ExtractionReport::new(run_id, &self.args);
        report.deleted = sink.delete_origin(&self.args.table, &report.params)?;
        tracing::info!(params = %report.params, deleted = report.deleted, "starting extraction");

        let batch_size = self.options.batch_size;
        let mut buffer: Vec<Record> = Vec::with_capacity(batch_size);
        let mut cursor: Option<u64> = None;

        loop {
            let rows = source.fetch_batch(&self.args, cursor, batch_size)?;
            let Some(last) = rows.last() else {
                break;
            };
            cursor = Some(last.id);

            let extractor = self.extractor;
            let results: Vec<Result<Vec<Record>, ExtractError>> =
                pool.install(|| rows.par_iter().map(|row| extractor.extract(row)).collect());

            for (row, result) in rows.iter().zip(results) {
                report.rows_processed += 1;
                match result {
                    Ok(records) => {
                        let origin = self.args.origin(row.id);
                        for mut record in records {
                            record.set_origin(origin.clone());
                            report.count(&record);
                            buffer.push(record);
                        }
                        if buffer.len() >= batch_size {
                            Self::save(sink, &mut buffer)?;
                        }
                    }
                    Err(err) => match self.options.on_row_error {
                        OnRowError::Skip => {
                            tracing::warn!(row_id = row.id, error = %err, "skipping raw row");
                            report.failures.push(RowFailure::new(row.id, &err));
                        }
                        OnRowError::Abort => {
                            tracing::error!(row_id = row.id, error = %err, "aborting extraction");
                            Self::save(sink, &mut buffer)?;
                            sink.flush()?;
                            return Err(RunnerError::Extract {
                                row_id: row.id,
                                source: err,
                            });
                        }
                    },
                }
            }
        }

        Self::save(sink, &mut buffer)?;
        sink.flush()?;

        tracing::info!(
            rows = report.rows_processed,
            builds = report.builds,
            build_commits = report.build_commits,
            failures = report.failures.len(),
            "extraction finished"
        );
        Ok(report)
    }

    fn save(sink: &mut dyn RecordSink, buffer: &mut Vec<Record>) -> Result<(), RunnerError> {
        if buffer.is_empty() {
            return Ok(());
        }
        tracing::debug!(records = buffer.len(), "saving batch");
        sink.save(buffer)?;
        buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RawDataOrigin;
    use crate::jenkins::models::BuildCommit;
    use crate::runtime::sink::{MemoryRawSource, MemorySink};
    use serde_json::json;

    fn args() -> RawDataSubTaskArgs {
        RawDataSubTaskArgs::new("_raw_test", &json!({"ConnectionId": 1})).unwrap()
    }

    fn rows(ids: &[u64]) -> MemoryRawSource {
        let key = args().params_key();
        let rows = ids
            .iter()
            .map(|id| RawRow {
                id: *id,
                params: key.clone(),
                data: id.to_string().into_bytes(),
                ..RawRow::default()
            })
            .collect();
        MemoryRawSource::new("_raw_test", rows)
    }

    /// One commit per row, failing on rows whose id is divisible by 5.
    fn commit_per_row(row: &RawRow) -> Result<Vec<Record>, ExtractError> {
        if row.id % 5 == 0 {
            let err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
            return Err(ExtractError::decode(DecodeStage::Response, err));
        }
        Ok(vec![Record::BuildCommit(BuildCommit {
            connection_id: 1,
            build_name: format!("job #{}", row.id),
            commit_sha: String::from_utf8_lossy(&row.data).into_owned(),
            repo_url: "u".to_string(),
            branch: String::new(),
            origin: RawDataOrigin::default(),
        })])
    }

    fn options(batch_size: usize, on_row_error: OnRowError) -> RunnerOptions {
        RunnerOptions {
            batch_size,
            workers: 2,
            on_row_error,
        }
    }

    #[test]
    fn test_pages_through_every_row_in_order() {
        let mut source = rows(&[4, 1, 3, 2, 6, 7, 8]);
        let mut sink = MemorySink::new();
        let runner = ApiExtractor::new(args(), &commit_per_row, options(3, OnRowError::Skip)).unwrap();

        let report = runner.execute(&mut source, &mut sink).unwrap();

        assert_eq!(report.rows_processed, 7);
        assert_eq!(report.build_commits, 7);
        let names: Vec<&str> = sink.build_commits().iter().map(|c| c.build_name.as_str()).collect();
        assert_eq!(names, vec!["job #1", "job #2", "job #3", "job #4", "job #6", "job #7", "job #8"]);
    }

    #[test]
    fn test_stamps_origin() {
        let mut source = rows(&[9]);
        let mut sink = MemorySink::new();
        let runner = ApiExtractor::new(args(), &commit_per_row, RunnerOptions::default()).unwrap();

        runner.execute(&mut source, &mut sink).unwrap();

        let origin = &sink.build_commits()[0].origin;
        assert_eq!(origin.raw_data_table, "_raw_test");
        assert_eq!(origin.raw_data_params, r#"{"ConnectionId":1}"#);
        assert_eq!(origin.raw_data_id, 9);
    }

    #[test]
    fn test_skip_policy_reports_failures() {
        let mut source = rows(&[1, 5, 6, 10]);
        let mut sink = MemorySink::new();
        let runner = ApiExtractor::new(args(), &commit_per_row, options(2, OnRowError::Skip)).unwrap();

        let report = runner.execute(&mut source, &mut sink).unwrap();

        assert_eq!(report.rows_processed, 4);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].row_id, 5);
        assert!(report.failures[0].is_stage(DecodeStage::Response));
        assert_eq!(sink.build_commits().len(), 2);
    }

    #[test]
    fn test_abort_policy_keeps_earlier_rows() {
        let mut source = rows(&[1, 2, 5, 6]);
        let mut sink = MemorySink::new();
        let runner = ApiExtractor::new(args(), &commit_per_row, options(10, OnRowError::Abort)).unwrap();

        let err = runner.execute(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, RunnerError::Extract { row_id: 5, .. }));
        assert_eq!(sink.build_commits().len(), 2);
    }

    #[test]
    fn test_replay_replaces_previous_pass() {
        let mut sink = MemorySink::new();
        let runner = ApiExtractor::new(args(), &commit_per_row, RunnerOptions::default()).unwrap();

        runner.execute(&mut rows(&[1, 2]), &mut sink).unwrap();
        let report = runner.execute(&mut rows(&[1, 2, 3]), &mut sink).unwrap();

        assert_eq!(report.deleted, 2);
        assert_eq!(sink.build_commits().len(), 3);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = ApiExtractor::new(args(), &commit_per_row, options(0, OnRowError::Skip));
        assert!(matches!(result, Err(RunnerError::Config(_))));
    }

    #[test]
    fn test_on_row_error_from_str() {
        assert_eq!("Abort".parse::<OnRowError>().unwrap(), OnRowError::Abort);
        assert!("retry".parse::<OnRowError>().is_err());
    }
}
