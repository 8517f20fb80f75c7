//! Where raw rows come from and where extracted records go.

use std::collections::HashSet;
use std::io::Write;

use crate::entity::Record;
use crate::error::RunnerError;
use crate::jenkins::models::{Build, BuildCommit};
use crate::runtime::raw_data::{RawDataSubTaskArgs, RawRow};
use crate::serialization::NdjsonWriter;

/// Pages raw rows out of storage.
pub trait RawRowSource {
    /// Rows of `args.table` collected under `args.params`, with ids strictly
    /// greater than `after` (all rows when `None`), ascending by id, at most
    /// `limit` of them.
    fn fetch_batch(
        &mut self,
        args: &RawDataSubTaskArgs,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<RawRow>, RunnerError>;
}

/// Persists records to their typed destinations.
pub trait RecordSink {
    /// Remove every record previously extracted from `table` under `params`.
    /// Returns how many records were removed.
    fn delete_origin(&mut self, table: &str, params: &str) -> Result<usize, RunnerError>;

    /// Store records, routing each by its type.
    fn save(&mut self, records: &[Record]) -> Result<(), RunnerError>;

    fn flush(&mut self) -> Result<(), RunnerError> {
        Ok(())
    }
}

/// Raw rows held in memory, e.g. loaded from an NDJSON dump.
#[derive(Debug, Clone, Default)]
pub struct MemoryRawSource {
    table: String,
    rows: Vec<RawRow>,
}

impl MemoryRawSource {
    pub fn new(table: impl Into<String>, mut rows: Vec<RawRow>) -> Self {
        rows.sort_by_key(|row| row.id);
        Self {
            table: table.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RawRowSource for MemoryRawSource {
    fn fetch_batch(
        &mut self,
        args: &RawDataSubTaskArgs,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<RawRow>, RunnerError> {
        if args.table != self.table {
            return Ok(Vec::new());
        }
        let params = args.params_key();
        Ok(self
            .rows
            .iter()
            .filter(|row| after.map_or(true, |after| row.id > after))
            .filter(|row| row.params == params)
            .take(limit)
            .cloned()
            .collect())
    }
}

type BuildKey = (u64, String, i64);
type BuildCommitKey = (u64, String, String, String);

fn build_key(build: &Build) -> BuildKey {
    (build.connection_id, build.job_name.clone(), build.number)
}

fn build_commit_key(commit: &BuildCommit) -> BuildCommitKey {
    (
        commit.connection_id,
        commit.build_name.clone(),
        commit.commit_sha.clone(),
        commit.repo_url.clone(),
    )
}

/// In-memory tables, one per record type.
///
/// Records whose primary key is already present are ignored, mirroring an
/// insert with `ON CONFLICT DO NOTHING`.
#[derive(Debug, Default)]
pub struct MemorySink {
    builds: Vec<Build>,
    build_commits: Vec<BuildCommit>,
    build_keys: HashSet<BuildKey>,
    build_commit_keys: HashSet<BuildCommitKey>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builds(&self) -> &[Build] {
        &self.builds
    }

    pub fn build_commits(&self) -> &[BuildCommit] {
        &self.build_commits
    }
}

impl RecordSink for MemorySink {
    fn delete_origin(&mut self, table: &str, params: &str) -> Result<usize, RunnerError> {
        let before = self.builds.len() + self.build_commits.len();
        let keep = |origin: &crate::entity::RawDataOrigin| {
            origin.raw_data_table != table || origin.raw_data_params != params
        };
        self.builds.retain(|b| keep(&b.origin));
        self.build_commits.retain(|c| keep(&c.origin));

        self.build_keys = self.builds.iter().map(build_key).collect();
        self.build_commit_keys = self.build_commits.iter().map(build_commit_key).collect();

        Ok(before - self.builds.len() - self.build_commits.len())
    }

    fn save(&mut self, records: &[Record]) -> Result<(), RunnerError> {
        for record in records {
            match record {
                Record::Build(build) => {
                    if self.build_keys.insert(build_key(build)) {
                        self.builds.push(build.clone());
                    }
                }
                Record::BuildCommit(commit) => {
                    if self.build_commit_keys.insert(build_commit_key(commit)) {
                        self.build_commits.push(commit.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

/// Streams records as NDJSON. Nothing is ever deleted.
pub struct WriterSink<W: Write> {
    writer: NdjsonWriter<W>,
    written: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: NdjsonWriter::new(writer),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    fn delete_origin(&mut self, _table: &str, _params: &str) -> Result<usize, RunnerError> {
        Ok(0)
    }

    fn save(&mut self, records: &[Record]) -> Result<(), RunnerError> {
        self.writer.write_all(records)?;
        self.written += records.len();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RunnerError> {
        self.writer.flush()?;
        Ok(())
    }
}
