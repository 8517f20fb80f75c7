//! Core entity trait and the polymorphic record handed to the runtime.
//!
//! Every normalized record produced by an extractor is an [`Entity`]: it knows
//! its own name and the destination table it is persisted to. The runtime
//! moves records around as [`Record`], a tagged sum over all entity types.

use serde::{Deserialize, Serialize};

use crate::jenkins::models::{Build, BuildCommit};

/// Lineage of a record: which raw table, parameter set and row produced it.
///
/// Extractors leave this empty; the runtime stamps it once the row has been
/// extracted successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDataOrigin {
    #[serde(default)]
    pub raw_data_params: String,
    #[serde(default)]
    pub raw_data_table: String,
    #[serde(default)]
    pub raw_data_id: u64,
    #[serde(default)]
    pub raw_data_remark: String,
}

impl RawDataOrigin {
    pub fn new(table: impl Into<String>, params: impl Into<String>, row_id: u64) -> Self {
        Self {
            raw_data_params: params.into(),
            raw_data_table: table.into(),
            raw_data_id: row_id,
            raw_data_remark: String::new(),
        }
    }
}

/// Core trait for all extracted entities.
///
/// # Example
///
/// ```ignore
/// use buildnom::Entity;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct JobRow {
///     name: String,
/// }
///
/// impl Entity for JobRow {
///     const NAME: &'static str = "JenkinsJob";
///     const TABLE: &'static str = "jenkins_jobs";
/// }
/// ```
pub trait Entity: Serialize + Sized {
    /// The name of this entity type
    const NAME: &'static str;

    /// Destination table the entity is persisted to
    const TABLE: &'static str;

    /// Convert entity to JSON string
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert entity to NDJSON line (newline-delimited JSON)
    fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        Ok(format!("{}\n", json))
    }
}

/// One extracted record of any entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    Build(Build),
    BuildCommit(BuildCommit),
}

impl Record {
    pub fn entity_name(&self) -> &'static str {
        match self {
            Record::Build(_) => Build::NAME,
            Record::BuildCommit(_) => BuildCommit::NAME,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Record::Build(_) => Build::TABLE,
            Record::BuildCommit(_) => BuildCommit::TABLE,
        }
    }

    pub fn origin(&self) -> &RawDataOrigin {
        match self {
            Record::Build(build) => &build.origin,
            Record::BuildCommit(commit) => &commit.origin,
        }
    }

    pub fn set_origin(&mut self, origin: RawDataOrigin) {
        match self {
            Record::Build(build) => build.origin = origin,
            Record::BuildCommit(commit) => commit.origin = origin,
        }
    }

    pub fn as_build(&self) -> Option<&Build> {
        match self {
            Record::Build(build) => Some(build),
            Record::BuildCommit(_) => None,
        }
    }

    pub fn as_build_commit(&self) -> Option<&BuildCommit> {
        match self {
            Record::BuildCommit(commit) => Some(commit),
            Record::Build(_) => None,
        }
    }
}

impl From<Build> for Record {
    fn from(build: Build) -> Self {
        Record::Build(build)
    }
}

impl From<BuildCommit> for Record {
    fn from(commit: BuildCommit) -> Self {
        Record::BuildCommit(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit() -> BuildCommit {
        BuildCommit {
            connection_id: 1,
            build_name: "deploy #7".to_string(),
            commit_sha: "abc123".to_string(),
            repo_url: "https://git.example.com/app.git".to_string(),
            branch: "origin/main".to_string(),
            origin: RawDataOrigin::default(),
        }
    }

    #[test]
    fn test_record_routes_by_type() {
        let record = Record::from(commit());

        assert_eq!(record.entity_name(), "JenkinsBuildCommit");
        assert_eq!(record.table(), "jenkins_build_commits");
        assert!(record.as_build().is_none());
        assert_eq!(record.as_build_commit().unwrap().commit_sha, "abc123");
    }

    #[test]
    fn test_record_json_is_tagged() {
        let json = serde_json::to_value(Record::from(commit())).unwrap();

        assert_eq!(json["type"], "BuildCommit");
        assert_eq!(json["repo_url"], "https://git.example.com/app.git");
        assert_eq!(json["raw_data_id"], 0);
    }

    #[test]
    fn test_set_origin() {
        let mut record = Record::from(commit());
        record.set_origin(RawDataOrigin::new("_raw_jenkins_api_builds", "{\"ConnectionId\":1}", 9));

        assert_eq!(record.origin().raw_data_id, 9);
        assert_eq!(record.origin().raw_data_table, "_raw_jenkins_api_builds");
    }

    #[test]
    fn test_entity_to_ndjson_line() {
        let line = commit().to_ndjson_line().unwrap();

        assert!(line.ends_with('\n'));
        assert!(line.contains("\"build_name\":\"deploy #7\""));
    }
}
