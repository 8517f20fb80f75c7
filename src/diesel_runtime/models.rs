//! Row types mapping records to and from the Postgres tables.
//!
//! Postgres has no unsigned integers, so ids are stored as `BIGINT` and
//! converted at this boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::diesel_runtime::schema::{jenkins_build_commits, jenkins_builds, raw_jenkins_api_builds};
use crate::entity::RawDataOrigin;
use crate::jenkins::models::{Build, BuildCommit};
use crate::runtime::raw_data::RawRow;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = raw_jenkins_api_builds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RawRowDb {
    pub id: i64,
    pub params: String,
    pub data: Vec<u8>,
    pub url: String,
    pub input: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl From<RawRowDb> for RawRow {
    fn from(row: RawRowDb) -> Self {
        RawRow {
            id: row.id as u64,
            params: row.params,
            data: row.data,
            url: row.url,
            input: row.input,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jenkins_builds)]
pub struct BuildDb {
    pub connection_id: i64,
    pub job_name: String,
    pub number: i64,
    pub duration: i64,
    pub full_display_name: String,
    pub estimated_duration: i64,
    pub result: String,
    pub timestamp: i64,
    pub class: String,
    pub start_time: DateTime<Utc>,
    pub commit_sha: String,
    pub triggered_by: String,
    pub raw_data_params: String,
    pub raw_data_table: String,
    pub raw_data_id: i64,
    pub raw_data_remark: String,
}

impl From<&Build> for BuildDb {
    fn from(build: &Build) -> Self {
        let RawDataOrigin {
            raw_data_params,
            raw_data_table,
            raw_data_id,
            raw_data_remark,
        } = build.origin.clone();
        BuildDb {
            connection_id: build.connection_id as i64,
            job_name: build.job_name.clone(),
            number: build.number,
            duration: build.duration,
            full_display_name: build.full_display_name.clone(),
            estimated_duration: build.estimated_duration,
            result: build.result.clone(),
            timestamp: build.timestamp,
            class: build.class.clone(),
            start_time: build.start_time,
            commit_sha: build.commit_sha.clone(),
            triggered_by: build.triggered_by.clone(),
            raw_data_params,
            raw_data_table,
            raw_data_id: raw_data_id as i64,
            raw_data_remark,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jenkins_build_commits)]
pub struct BuildCommitDb {
    pub connection_id: i64,
    pub build_name: String,
    pub commit_sha: String,
    pub repo_url: String,
    pub branch: String,
    pub raw_data_params: String,
    pub raw_data_table: String,
    pub raw_data_id: i64,
    pub raw_data_remark: String,
}

impl From<&BuildCommit> for BuildCommitDb {
    fn from(commit: &BuildCommit) -> Self {
        BuildCommitDb {
            connection_id: commit.connection_id as i64,
            build_name: commit.build_name.clone(),
            commit_sha: commit.commit_sha.clone(),
            repo_url: commit.repo_url.clone(),
            branch: commit.branch.clone(),
            raw_data_params: commit.origin.raw_data_params.clone(),
            raw_data_table: commit.origin.raw_data_table.clone(),
            raw_data_id: commit.origin.raw_data_id as i64,
            raw_data_remark: commit.origin.raw_data_remark.clone(),
        }
    }
}
