//! Normalized Jenkins records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, RawDataOrigin, Record};

/// One Jenkins build, keyed by `(connection_id, job_name, number)`.
///
/// `commit_sha` and `triggered_by` are empty when they could not be derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub connection_id: u64,
    pub job_name: String,
    pub duration: i64,
    pub full_display_name: String,
    pub estimated_duration: i64,
    pub number: i64,
    pub result: String,
    /// Start of the build in epoch milliseconds, as reported upstream
    pub timestamp: i64,
    /// Last dotted segment of the upstream class, e.g. `FreeStyleBuild`
    pub class: String,
    /// `timestamp` truncated to whole seconds
    pub start_time: DateTime<Utc>,
    pub commit_sha: String,
    /// `"<upstream project> #<upstream build>"` of the triggering build
    pub triggered_by: String,
    #[serde(flatten)]
    pub origin: RawDataOrigin,
}

impl Entity for Build {
    const NAME: &'static str = "JenkinsBuild";
    const TABLE: &'static str = "jenkins_builds";
}

/// A repository revision a build checked out.
///
/// `build_name` carries the build's full display name; it is a denormalized
/// link rather than a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommit {
    pub connection_id: u64,
    pub build_name: String,
    pub commit_sha: String,
    pub repo_url: String,
    pub branch: String,
    #[serde(flatten)]
    pub origin: RawDataOrigin,
}

impl Entity for BuildCommit {
    const NAME: &'static str = "JenkinsBuildCommit";
    const TABLE: &'static str = "jenkins_build_commits";
}

/// Everything extracted from one raw build row.
///
/// There is always exactly one build; commits are in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedBuild {
    pub build: Build,
    pub commits: Vec<BuildCommit>,
}

impl ExtractedBuild {
    /// Flatten into the runtime's record sequence, build first.
    pub fn into_records(self) -> Vec<Record> {
        let mut records = Vec::with_capacity(1 + self.commits.len());
        records.push(Record::Build(self.build));
        records.extend(self.commits.into_iter().map(Record::BuildCommit));
        records
    }
}
