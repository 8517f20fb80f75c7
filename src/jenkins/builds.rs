//! Build extraction: one raw build payload into a build and its commits.

use chrono::{DateTime, Utc};

use crate::entity::{RawDataOrigin, Record};
use crate::error::{DecodeStage, ExtractError};
use crate::jenkins::api::{self, Action, BuildApiResponse, JobContext, VcsKind};
use crate::jenkins::models::{Build, BuildCommit, ExtractedBuild};
use crate::runtime::api_extractor::RowExtractor;
use crate::runtime::raw_data::RawRow;

/// Extract a build and its commits from one raw row's `data` and `input`.
///
/// Pure: the same bytes always produce the same records. Fails only when
/// either payload is not valid JSON of the expected shape, and in that case
/// nothing is emitted.
pub fn extract_build(
    connection_id: u64,
    data: &[u8],
    input: &[u8],
) -> Result<ExtractedBuild, ExtractError> {
    let body: BuildApiResponse =
        api::decode(data).map_err(|e| ExtractError::decode(DecodeStage::Response, e))?;
    let job: JobContext =
        api::decode(input).map_err(|e| ExtractError::decode(DecodeStage::Context, e))?;

    let mut build = Build {
        connection_id,
        job_name: job.name,
        duration: body.duration,
        full_display_name: body.build_display_name().to_string(),
        estimated_duration: body.estimated_duration,
        number: body.number,
        result: body.result.clone(),
        timestamp: body.timestamp,
        class: body.short_class().to_string(),
        start_time: start_time(body.timestamp),
        commit_sha: String::new(),
        triggered_by: String::new(),
        origin: RawDataOrigin::default(),
    };

    let commits = match body.change_set.vcs() {
        VcsKind::Git | VcsKind::Mercurial => {
            let walk = body
                .actions
                .iter()
                .fold(ActionWalk::default(), |walk, action| {
                    walk.step(action, connection_id, &build.full_display_name)
                });
            if let Some(sha) = walk.build_sha {
                build.commit_sha = sha;
            }
            if let Some(triggered_by) = walk.triggered_by {
                build.triggered_by = triggered_by;
            }
            walk.commits
        }
        VcsKind::Subversion => {
            if let Some(first) = body.change_set.revisions.first() {
                build.commit_sha = first.revision.to_string();
            }
            Vec::new()
        }
        VcsKind::Other => Vec::new(),
    };

    Ok(ExtractedBuild { build, commits })
}

/// Epoch milliseconds truncated to whole seconds.
fn start_time(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp_ms / 1000, 0).unwrap_or_default()
}

/// Accumulator threaded through a build's actions for git and hg change sets.
#[derive(Debug, Default)]
struct ActionWalk {
    /// Last resolved revision; carried into actions that resolve none
    sha: String,
    /// Value assigned to the build's commit sha, rewritten by every action
    build_sha: Option<String>,
    triggered_by: Option<String>,
    commits: Vec<BuildCommit>,
}

impl ActionWalk {
    fn step(mut self, action: &Action, connection_id: u64, build_name: &str) -> Self {
        let revision = &action.last_built_revision;
        if !revision.sha().is_empty() {
            self.sha = revision.sha().to_string();
        } else if !action.mercurial_revision_number.is_empty() {
            self.sha = action.mercurial_revision_number.clone();
        }
        // An action without a revision still rewrites the build's sha, with
        // the value carried over from the previous action.
        self.build_sha = Some(self.sha.clone());

        let branch = revision.first_branch().unwrap_or_default();
        for url in action.remote_urls.iter().filter(|url| !url.is_empty()) {
            self.commits.push(BuildCommit {
                connection_id,
                build_name: build_name.to_string(),
                commit_sha: self.sha.clone(),
                repo_url: url.clone(),
                branch: branch.to_string(),
                origin: RawDataOrigin::default(),
            });
        }

        for cause in action.causes.iter().filter(|c| !c.upstream_project.is_empty()) {
            self.triggered_by = Some(format!("{} #{}", cause.upstream_project, cause.upstream_build));
        }

        self
    }
}

/// Row extractor for the `_raw_jenkins_api_builds` table.
#[derive(Debug, Clone, Copy)]
pub struct BuildExtractor {
    connection_id: u64,
}

impl BuildExtractor {
    pub fn new(connection_id: u64) -> Self {
        Self { connection_id }
    }
}

impl RowExtractor for BuildExtractor {
    fn extract(&self, row: &RawRow) -> Result<Vec<Record>, ExtractError> {
        extract_build(self.connection_id, &row.data, &row.input).map(ExtractedBuild::into_records)
    }
}
