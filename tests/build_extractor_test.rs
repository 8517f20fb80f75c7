//! Integration tests for Jenkins build extraction

use buildnom::{extract_build, DecodeStage, Record};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn bytes(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn git_build() -> Vec<u8> {
    bytes(json!({
        "_class": "org.jenkinsci.plugins.workflow.job.WorkflowRun",
        "fullDisplayName": "deploy-service #88",
        "number": 88,
        "duration": 61000,
        "estimatedDuration": 59000,
        "result": "SUCCESS",
        "timestamp": 1700000000123i64,
        "changeSet": {"kind": "git"},
        "actions": [
            {"_class": "hudson.model.CauseAction"},
            {
                "lastBuiltRevision": {
                    "SHA1": "3f2a9c1e",
                    "branches": [{"name": "origin/main"}, {"name": "origin/release"}]
                },
                "remoteUrls": ["https://git.example.com/u1.git", "https://git.example.com/u2.git", ""]
            },
            {"causes": [{"upstreamProject": "pipelineA", "upstreamBuild": 12}]}
        ]
    }))
}

fn job() -> Vec<u8> {
    bytes(json!({"name": "deploy-service", "path": "job/deploy-service"}))
}

#[test]
fn test_git_build_with_several_remotes() {
    let extracted = extract_build(3, &git_build(), &job()).unwrap();
    let build = &extracted.build;

    assert_eq!(build.connection_id, 3);
    assert_eq!(build.job_name, "deploy-service");
    assert_eq!(build.full_display_name, "deploy-service #88");
    assert_eq!(build.number, 88);
    assert_eq!(build.duration, 61000);
    assert_eq!(build.estimated_duration, 59000);
    assert_eq!(build.result, "SUCCESS");
    assert_eq!(build.class, "WorkflowRun");
    assert_eq!(build.start_time, Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
    assert_eq!(build.commit_sha, "3f2a9c1e");
    assert_eq!(build.triggered_by, "pipelineA #12");

    let urls: Vec<&str> = extracted.commits.iter().map(|c| c.repo_url.as_str()).collect();
    assert_eq!(urls, vec!["https://git.example.com/u1.git", "https://git.example.com/u2.git"]);
    for commit in &extracted.commits {
        assert_eq!(commit.connection_id, 3);
        assert_eq!(commit.build_name, "deploy-service #88");
        assert_eq!(commit.commit_sha, "3f2a9c1e");
        assert_eq!(commit.branch, "origin/main");
    }
}

#[test]
fn test_extraction_is_deterministic() {
    let first = extract_build(1, &git_build(), &job()).unwrap().into_records();
    let second = extract_build(1, &git_build(), &job()).unwrap().into_records();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(matches!(first[0], Record::Build(_)));
}

#[test]
fn test_sparse_payload_still_yields_a_build() {
    let extracted = extract_build(1, b"{}", b"{}").unwrap();
    let build = &extracted.build;

    assert_eq!(build.job_name, "");
    assert_eq!(build.number, 0);
    assert_eq!(build.class, "");
    assert_eq!(build.commit_sha, "");
    assert_eq!(build.triggered_by, "");
    assert_eq!(build.start_time, Utc.timestamp_opt(0, 0).unwrap());
    assert!(extracted.commits.is_empty());
}

#[test]
fn test_null_fields_are_treated_as_missing() {
    let data = bytes(json!({
        "_class": null,
        "result": null,
        "number": 4,
        "changeSet": {"kind": "git", "revisions": null},
        "actions": [null, {"remoteUrls": null, "causes": null}]
    }));

    let extracted = extract_build(1, &data, &bytes(json!({"name": null}))).unwrap();

    assert_eq!(extracted.build.number, 4);
    assert_eq!(extracted.build.result, "");
    assert_eq!(extracted.build.job_name, "");
    assert!(extracted.commits.is_empty());
}

#[test]
fn test_class_without_dots_is_kept_whole() {
    let data = bytes(json!({"_class": "FreeStyleBuild"}));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.class, "FreeStyleBuild");
}

#[test]
fn test_svn_takes_first_revision() {
    let data = bytes(json!({
        "fullDisplayName": "nightly #7",
        "changeSet": {"kind": "svn", "revisions": [{"revision": 4521}, {"revision": 4519}]},
        "actions": [{"remoteUrls": ["https://svn.example.com/repo"]}]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.commit_sha, "4521");
    assert!(extracted.commits.is_empty());
}

#[test]
fn test_unknown_vcs_emits_no_commits() {
    let data = bytes(json!({
        "changeSet": {"kind": "p4"},
        "actions": [{
            "lastBuiltRevision": {"SHA1": "abc"},
            "remoteUrls": ["https://git.example.com/u1.git"]
        }]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.commit_sha, "");
    assert!(extracted.commits.is_empty());
}

#[test]
fn test_mercurial_revision_number() {
    let data = bytes(json!({
        "fullDisplayName": "hg-job #2",
        "changeSet": {"kind": "hg"},
        "actions": [{
            "mercurialRevisionNumber": "a1b2c3d4",
            "remoteUrls": ["https://hg.example.com/repo"]
        }]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.commit_sha, "a1b2c3d4");
    assert_eq!(extracted.commits.len(), 1);
    assert_eq!(extracted.commits[0].commit_sha, "a1b2c3d4");
    assert_eq!(extracted.commits[0].branch, "");
}

#[test]
fn test_revision_carries_into_later_actions() {
    let data = bytes(json!({
        "fullDisplayName": "multi #1",
        "changeSet": {"kind": "git"},
        "actions": [
            {"lastBuiltRevision": {"SHA1": "first"}, "remoteUrls": ["u1"]},
            {"remoteUrls": ["u2"]}
        ]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.commit_sha, "first");
    let shas: Vec<&str> = extracted.commits.iter().map(|c| c.commit_sha.as_str()).collect();
    assert_eq!(shas, vec!["first", "first"]);
}

#[test]
fn test_last_upstream_cause_wins() {
    let data = bytes(json!({
        "actions": [
            {"causes": [{"upstreamProject": "pipelineA", "upstreamBuild": 12}]},
            {"causes": [{"shortDescription": "Started by user"}, {"upstreamProject": "pipelineB", "upstreamBuild": 3}]}
        ]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.triggered_by, "");

    let git = bytes(json!({
        "changeSet": {"kind": "git"},
        "actions": [
            {"causes": [{"upstreamProject": "pipelineA", "upstreamBuild": 12}]},
            {"causes": [{"shortDescription": "Started by user"}, {"upstreamProject": "pipelineB", "upstreamBuild": 3}]}
        ]
    }));

    let extracted = extract_build(1, &git, &job()).unwrap();

    assert_eq!(extracted.build.triggered_by, "pipelineB #3");
}

#[test]
fn test_invalid_data_fails_at_response_stage() {
    let err = extract_build(1, b"{not json", &job()).unwrap_err();

    assert_eq!(err.stage(), DecodeStage::Response);
    assert!(err.to_string().starts_with("failed to decode response"));
}

#[test]
fn test_invalid_input_fails_at_context_stage() {
    let err = extract_build(1, &git_build(), b"job: deploy").unwrap_err();

    assert_eq!(err.stage(), DecodeStage::Context);
}

#[test]
fn test_arrays_are_not_payloads() {
    let err = extract_build(1, b"[]", &job()).unwrap_err();
    assert_eq!(err.stage(), DecodeStage::Response);

    let err = extract_build(1, br#"["hudson.model.FreeStyleBuild"]"#, &job()).unwrap_err();
    assert_eq!(err.stage(), DecodeStage::Response);

    let err = extract_build(1, &bytes(json!({"number": 1})), b"[]").unwrap_err();
    assert_eq!(err.stage(), DecodeStage::Context);

    let err = extract_build(1, &bytes(json!({"number": 1})), br#"["job"]"#).unwrap_err();
    assert_eq!(err.stage(), DecodeStage::Context);
}

#[test]
fn test_nested_array_in_place_of_object_fails() {
    let change_set = bytes(json!({"number": 1, "changeSet": []}));
    assert_eq!(extract_build(1, &change_set, &job()).unwrap_err().stage(), DecodeStage::Response);

    let revision = bytes(json!({
        "changeSet": {"kind": "git"},
        "actions": [{"lastBuiltRevision": ["abc"], "remoteUrls": ["u1"]}]
    }));
    assert_eq!(extract_build(1, &revision, &job()).unwrap_err().stage(), DecodeStage::Response);
}

#[test]
fn test_both_sha1_keys_decode() {
    let data = bytes(json!({
        "fullDisplayName": "dual #1",
        "changeSet": {"kind": "git"},
        "actions": [{
            "lastBuiltRevision": {"SHA1": "upper", "sha1": "lower"},
            "remoteUrls": ["u1"]
        }]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.commit_sha, "upper");
    assert_eq!(extracted.commits[0].commit_sha, "upper");
}

#[test]
fn test_cause_with_empty_upstream_project_is_ignored() {
    let data = bytes(json!({
        "changeSet": {"kind": "git"},
        "actions": [
            {"causes": [{"upstreamProject": "pipelineA", "upstreamBuild": 12}]},
            {"causes": [{"upstreamProject": "", "upstreamBuild": 0}]}
        ]
    }));

    let extracted = extract_build(1, &data, &job()).unwrap();

    assert_eq!(extracted.build.triggered_by, "pipelineA #12");

    let only_empty = bytes(json!({
        "changeSet": {"kind": "git"},
        "actions": [{"causes": [{"upstreamProject": "", "upstreamBuild": 0}]}]
    }));

    let extracted = extract_build(1, &only_empty, &job()).unwrap();

    assert_eq!(extracted.build.triggered_by, "");
}

#[test]
fn test_records_serialize_with_type_tag() {
    let records = extract_build(1, &git_build(), &job()).unwrap().into_records();

    let value = serde_json::to_value(&records[1]).unwrap();

    assert_eq!(value["type"], "BuildCommit");
    assert_eq!(value["repo_url"], "https://git.example.com/u1.git");
}
