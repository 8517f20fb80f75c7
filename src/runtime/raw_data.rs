//! Raw rows and the parameter set that selects them.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::entity::RawDataOrigin;

/// A stored, previously fetched payload awaiting extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub id: u64,
    /// Canonical JSON of the parameter set the row was collected under
    pub params: String,
    /// Upstream API response body
    pub data: Vec<u8>,
    pub url: String,
    /// Serialized request context the fetch was made with
    pub input: Vec<u8>,
}

/// One raw row as written in an NDJSON dump.
///
/// `data` and `input` are embedded JSON. A JSON string is taken verbatim as
/// the raw bytes, which lets dumps carry payloads that are not valid JSON.
#[derive(Debug, Deserialize)]
struct RawRowLine {
    id: u64,
    #[serde(default)]
    params: Option<String>,
    #[serde(default)]
    url: String,
    data: JsonValue,
    input: JsonValue,
}

fn payload_bytes(value: JsonValue) -> Result<Vec<u8>, serde_json::Error> {
    match value {
        JsonValue::String(raw) => Ok(raw.into_bytes()),
        other => serde_json::to_vec(&other),
    }
}

impl RawRow {
    /// Parse one line of an NDJSON raw row dump.
    ///
    /// Rows without `params` are assigned `default_params`.
    pub fn from_ndjson_line(line: &str, default_params: &str) -> Result<Self, serde_json::Error> {
        let parsed: RawRowLine = serde_json::from_str(line)?;
        Ok(Self {
            id: parsed.id,
            params: parsed.params.unwrap_or_else(|| default_params.to_string()),
            data: payload_bytes(parsed.data)?,
            url: parsed.url,
            input: payload_bytes(parsed.input)?,
        })
    }
}

/// Identifies the raw rows a subtask scans: a table and a parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataSubTaskArgs {
    pub table: String,
    pub params: JsonValue,
}

impl RawDataSubTaskArgs {
    pub fn new<P: Serialize>(table: impl Into<String>, params: &P) -> Result<Self, serde_json::Error> {
        Ok(Self {
            table: table.into(),
            params: serde_json::to_value(params)?,
        })
    }

    /// Compact JSON of the parameter set, as stored alongside raw rows and
    /// extracted records.
    pub fn params_key(&self) -> String {
        self.params.to_string()
    }

    /// Lineage stamped onto every record extracted from `row_id`.
    pub fn origin(&self, row_id: u64) -> RawDataOrigin {
        RawDataOrigin::new(self.table.clone(), self.params_key(), row_id)
    }
}
