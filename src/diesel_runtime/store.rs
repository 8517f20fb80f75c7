//! Postgres-backed raw row source and record sink.

use diesel::prelude::*;

use crate::diesel_runtime::database::Database;
use crate::diesel_runtime::models::{BuildCommitDb, BuildDb, RawRowDb};
use crate::diesel_runtime::schema::{jenkins_build_commits, jenkins_builds, raw_jenkins_api_builds};
use crate::entity::Record;
use crate::error::RunnerError;
use crate::jenkins::RAW_BUILD_TABLE;
use crate::runtime::raw_data::{RawDataSubTaskArgs, RawRow};
use crate::runtime::sink::{RawRowSource, RecordSink};

/// Pages `_raw_jenkins_api_builds` by id.
pub struct DieselRawSource {
    db: Database,
}

impl DieselRawSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl RawRowSource for DieselRawSource {
    fn fetch_batch(
        &mut self,
        args: &RawDataSubTaskArgs,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<RawRow>, RunnerError> {
        if args.table != RAW_BUILD_TABLE {
            return Err(RunnerError::Config(format!("Unsupported raw table: {}", args.table)));
        }
        let conn = &mut self.db.get_connection()?;

        let after = after.map_or(-1, |id| id as i64);
        let rows = raw_jenkins_api_builds::table
            .filter(raw_jenkins_api_builds::params.eq(args.params_key()))
            .filter(raw_jenkins_api_builds::id.gt(after))
            .order(raw_jenkins_api_builds::id.asc())
            .limit(limit as i64)
            .select(RawRowDb::as_select())
            .load(conn)?;

        tracing::debug!(rows = rows.len(), after, "fetched raw rows");
        Ok(rows.into_iter().map(RawRow::from).collect())
    }
}

/// Writes builds to `jenkins_builds` and commits to `jenkins_build_commits`.
///
/// Rows whose primary key already exists are left untouched.
pub struct DieselRecordSink {
    db: Database,
}

impl DieselRecordSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl RecordSink for DieselRecordSink {
    fn delete_origin(&mut self, table: &str, params: &str) -> Result<usize, RunnerError> {
        let conn = &mut self.db.get_connection()?;

        conn.transaction(|conn| {
            let builds = diesel::delete(
                jenkins_builds::table
                    .filter(jenkins_builds::raw_data_table.eq(table))
                    .filter(jenkins_builds::raw_data_params.eq(params)),
            )
            .execute(conn)?;
            let commits = diesel::delete(
                jenkins_build_commits::table
                    .filter(jenkins_build_commits::raw_data_table.eq(table))
                    .filter(jenkins_build_commits::raw_data_params.eq(params)),
            )
            .execute(conn)?;
            Ok::<_, diesel::result::Error>(builds + commits)
        })
        .map_err(RunnerError::from)
    }

    fn save(&mut self, records: &[Record]) -> Result<(), RunnerError> {
        let builds: Vec<BuildDb> = records.iter().filter_map(Record::as_build).map(BuildDb::from).collect();
        let commits: Vec<BuildCommitDb> = records
            .iter()
            .filter_map(Record::as_build_commit)
            .map(BuildCommitDb::from)
            .collect();

        let conn = &mut self.db.get_connection()?;
        conn.transaction(|conn| {
            if !builds.is_empty() {
                diesel::insert_into(jenkins_builds::table)
                    .values(&builds)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
            if !commits.is_empty() {
                diesel::insert_into(jenkins_build_commits::table)
                    .values(&commits)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;

        tracing::debug!(builds = builds.len(), build_commits = commits.len(), "saved records");
        Ok(())
    }
}
