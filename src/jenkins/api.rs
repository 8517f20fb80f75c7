//! Wire shapes of the Jenkins JSON API as stored in raw rows.
//!
//! Decoding is lenient: unknown fields are ignored, and missing or `null`
//! values fall back to the field's zero value. Everything typed as a struct
//! here must be a JSON object, at the top level and when nested; an array or
//! scalar in its place fails to decode. Use [`decode`] for whole payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

/// Decode a payload that must be a JSON object.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    let map: Map<String, JsonValue> = serde_json::from_slice(bytes)?;
    T::deserialize(JsonValue::Object(map))
}

/// Decode `T` from an object. Derived struct impls also accept arrays as
/// positional fields, so the object shape is checked before handing over.
fn from_object<T: DeserializeOwned, E: serde::de::Error>(map: Map<String, JsonValue>) -> Result<T, E> {
    T::deserialize(JsonValue::Object(map)).map_err(E::custom)
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Nested object; `null` decodes as the default.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<Map<String, JsonValue>>::deserialize(deserializer)? {
        Some(map) => from_object(map),
        None => Ok(T::default()),
    }
}

/// Array that tolerates `null` (as empty) and `null` elements (skipped).
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

/// Like [`lenient_seq`], for arrays whose elements are objects.
fn lenient_objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<Option<Map<String, JsonValue>>>>::deserialize(deserializer)?
        .unwrap_or_default();
    items
        .into_iter()
        .flatten()
        .map(|map| from_object::<T, D::Error>(map))
        .collect()
}

/// Response body of `GET /job/<name>/<number>/api/json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildApiResponse {
    /// Jenkins sends the type name as `_class`
    #[serde(rename = "_class", deserialize_with = "null_as_default")]
    pub jenkins_class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_duration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub number: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub result: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(deserialize_with = "object_or_default")]
    pub change_set: ChangeSet,
    #[serde(deserialize_with = "lenient_objects")]
    pub actions: Vec<Action>,
}

impl BuildApiResponse {
    /// Dotted type name, preferring `_class` over `class`.
    pub fn raw_class(&self) -> &str {
        if self.jenkins_class.is_empty() {
            &self.class
        } else {
            &self.jenkins_class
        }
    }

    /// Last segment of the dotted type name (the whole name if undotted).
    pub fn short_class(&self) -> &str {
        let raw = self.raw_class();
        raw.rsplit('.').next().unwrap_or(raw)
    }

    /// `fullDisplayName` when present, else `displayName`.
    pub fn build_display_name(&self) -> &str {
        if self.full_display_name.is_empty() {
            &self.display_name
        } else {
            &self.full_display_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChangeSet {
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_objects")]
    pub revisions: Vec<Revision>,
}

impl ChangeSet {
    pub fn vcs(&self) -> VcsKind {
        VcsKind::from_kind(&self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Revision {
    #[serde(deserialize_with = "null_as_default")]
    pub revision: i64,
}

/// Version control system that produced a build's change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Mercurial,
    Subversion,
    /// Anything else, including an empty kind
    Other,
}

impl VcsKind {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "git" => VcsKind::Git,
            "hg" => VcsKind::Mercurial,
            "svn" => VcsKind::Subversion,
            _ => VcsKind::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Action {
    #[serde(deserialize_with = "object_or_default")]
    pub last_built_revision: LastBuiltRevision,
    #[serde(deserialize_with = "null_as_default")]
    pub mercurial_revision_number: String,
    #[serde(deserialize_with = "lenient_seq")]
    pub remote_urls: Vec<String>,
    #[serde(deserialize_with = "lenient_objects")]
    pub causes: Vec<Cause>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LastBuiltRevision {
    #[serde(rename = "SHA1", deserialize_with = "null_as_default")]
    pub jenkins_sha1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sha1: String,
    #[serde(deserialize_with = "lenient_seq")]
    pub branches: Vec<Branch>,
    /// Older git plugins name the list `branch`
    #[serde(deserialize_with = "lenient_seq")]
    pub branch: Vec<Branch>,
}

impl LastBuiltRevision {
    /// Revision hash, preferring `SHA1` over `sha1`.
    pub fn sha(&self) -> &str {
        if self.jenkins_sha1.is_empty() {
            &self.sha1
        } else {
            &self.jenkins_sha1
        }
    }

    /// Name of the first branch the revision was built from, if any.
    pub fn first_branch(&self) -> Option<&str> {
        self.branches
            .first()
            .or_else(|| self.branch.first())
            .map(|b| b.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Branch {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cause {
    #[serde(deserialize_with = "null_as_default")]
    pub upstream_project: String,
    #[serde(deserialize_with = "null_as_default")]
    pub upstream_build: i64,
}

/// Job reference a build was fetched under, stored in the raw row's `input`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobContext {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
}
