//! Jenkins build extraction.
//!
//! Raw build payloads fetched from the Jenkins JSON API are stored in
//! [`RAW_BUILD_TABLE`] keyed by [`JenkinsApiParams`]. The `extractApiBuilds`
//! subtask turns each row into a [`Build`](models::Build) plus one
//! [`BuildCommit`](models::BuildCommit) per remote repository URL.

pub mod api;
pub mod builds;
pub mod models;

use serde::{Deserialize, Serialize};

use crate::runtime::raw_data::RawDataSubTaskArgs;
use crate::runtime::subtask::{DomainType, SubTaskMeta};

pub use builds::{extract_build, BuildExtractor};
pub use models::{Build, BuildCommit, ExtractedBuild};

/// Raw table holding fetched build payloads.
pub const RAW_BUILD_TABLE: &str = "_raw_jenkins_api_builds";

/// Parameter set identifying the raw rows of one Jenkins connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsApiParams {
    #[serde(rename = "ConnectionId")]
    pub connection_id: u64,
}

impl JenkinsApiParams {
    pub fn new(connection_id: u64) -> Self {
        Self { connection_id }
    }

    /// Runner arguments scanning [`RAW_BUILD_TABLE`] for this connection.
    pub fn build_args(&self) -> Result<RawDataSubTaskArgs, serde_json::Error> {
        RawDataSubTaskArgs::new(RAW_BUILD_TABLE, self)
    }
}

/// Metadata of the build extraction subtask.
pub fn extract_api_builds_meta() -> SubTaskMeta {
    SubTaskMeta {
        name: "extractApiBuilds".to_string(),
        enabled_by_default: true,
        description: "Extract raw builds data into tool layer table jenkins_builds".to_string(),
        domain_types: vec![DomainType::Cicd],
    }
}
