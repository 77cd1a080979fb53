//! Calibration database client.
//!
//! `CalibrationService` is the seam between the selection handlers in
//! `cmd/` and the remote service. `HttpService` is the one production
//! implementation; tests substitute an in-memory fake.
//!
//! Record types mirror the service's JSON payloads. Identifier fields accept
//! JSON strings or numbers, since the service is not consistent about it.
//! Timestamps are only logged, so any scalar is taken as text.

pub mod http;
pub mod server;

use anyhow::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use http::HttpService;

/// Remote operations the selector relies on. Every call blocks until done.
pub trait CalibrationService {
    /// The globally best run, or `None` when the service has none to offer.
    fn best_run(&self) -> Result<Option<BestRun>>;

    /// Metadata for the most recently created calibration, or `None` when no
    /// calibration exists.
    fn latest_calibration(&self) -> Result<Option<CalibrationMeta>>;

    /// Stage the calibration archive for `hash_id` into `output_folder`.
    /// Returns the path of the staged file.
    fn download_calibration(&self, hash_id: &str, output_folder: &Path) -> Result<PathBuf>;

    /// All result rows recorded for `hash_id`, newest first.
    fn list_results(&self, hash_id: &str) -> Result<Vec<ResultRow>>;

    /// Stage the result archive for `(hash_id, run_id)` into `output_folder`.
    fn download_results(&self, hash_id: &str, run_id: &str, output_folder: &Path)
    -> Result<PathBuf>;
}

/// Response of the best-run lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BestRun {
    #[serde(rename = "hashID", deserialize_with = "id_string")]
    pub hash_id: String,
    #[serde(rename = "runID", deserialize_with = "id_string")]
    pub run_id: String,
    #[serde(default, deserialize_with = "opt_text")]
    pub created_at: Option<String>,
}

impl BestRun {
    /// Both identifiers are non-empty.
    pub fn is_usable(&self) -> bool {
        !self.hash_id.is_empty() && !self.run_id.is_empty()
    }
}

/// Metadata of one calibration set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationMeta {
    #[serde(rename = "hashID", deserialize_with = "id_string")]
    pub hash_id: String,
    #[serde(default, deserialize_with = "opt_text")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CalibrationMeta {
    /// Decode a latest-calibration payload.
    ///
    /// `null` and `{}` mean "no calibration". Any other object must carry
    /// `hashID`; a missing one is a decode error.
    pub fn from_payload(value: Value) -> Result<Option<Self>> {
        match &value {
            Value::Null => return Ok(None),
            Value::Object(map) if map.is_empty() => return Ok(None),
            _ => {}
        }
        let meta = serde_json::from_value(value)
            .map_err(|e| anyhow::anyhow!("malformed calibration metadata: {e}"))?;
        Ok(Some(meta))
    }
}

/// One row of a calibration's result list. Only `run_id` is interpreted;
/// other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    run_id: Option<String>,
}

impl ResultRow {
    #[cfg(test)]
    pub fn new(run_id: Option<&str>) -> Self {
        Self {
            run_id: run_id.map(str::to_string),
        }
    }

    /// Decode one list element. Never fails: a non-object row, or a `run_id`
    /// that is neither a string nor an integer, yields a row without an id.
    pub fn from_value(value: Value) -> Self {
        let run_id = match value {
            Value::Object(map) => map.get("run_id").and_then(id_from_value),
            _ => None,
        };
        Self { run_id }
    }

    /// The run identifier, treating absent, `null` and `""` alike as none.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref().filter(|id| !id.is_empty())
    }
}

/* ---- Lenient identifier decoding ---- */

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Uint(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Uint(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    RawId::deserialize(de).map(String::from)
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn opt_text<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn best_run_accepts_numeric_run_id() {
        let best: BestRun = serde_json::from_value(json!({
            "hashID": "a1b2",
            "runID": 42,
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(best.run_id, "42");
        assert!(best.is_usable());
    }

    #[test]
    fn best_run_with_empty_id_is_unusable() {
        let best: BestRun =
            serde_json::from_value(json!({"hashID": "", "runID": "r"})).unwrap();
        assert!(!best.is_usable());
        assert_eq!(best.created_at, None);
    }

    #[test]
    fn latest_payload_null_or_empty_is_none() {
        assert!(CalibrationMeta::from_payload(json!(null)).unwrap().is_none());
        assert!(CalibrationMeta::from_payload(json!({})).unwrap().is_none());
    }

    #[test]
    fn latest_payload_keeps_extra_fields() {
        let meta = CalibrationMeta::from_payload(json!({
            "hashID": "cafe",
            "qubits": 5
        }))
        .unwrap()
        .unwrap();
        assert_eq!(meta.hash_id, "cafe");
        assert_eq!(meta.extra.get("qubits"), Some(&json!(5)));
    }

    #[test]
    fn latest_payload_without_hash_is_error() {
        let err = CalibrationMeta::from_payload(json!({"created_at": "x"})).unwrap_err();
        assert!(err.to_string().contains("malformed calibration metadata"));
    }

    #[test]
    fn numeric_created_at_is_kept_as_text() {
        let best: BestRun = serde_json::from_value(json!({
            "hashID": "h",
            "runID": "r",
            "created_at": 1717243200
        }))
        .unwrap();
        assert_eq!(best.created_at.as_deref(), Some("1717243200"));

        let meta = CalibrationMeta::from_payload(json!({
            "hashID": "h",
            "created_at": 1717243200
        }))
        .unwrap()
        .unwrap();
        assert_eq!(meta.created_at.as_deref(), Some("1717243200"));
        assert!(!meta.extra.contains_key("created_at"));
    }

    #[test]
    fn result_row_run_id_absent_null_empty() {
        let ids: Vec<Option<String>> = [
            json!({"status": "running"}),
            json!({"run_id": null}),
            json!({"run_id": ""}),
            json!({"run_id": "R7", "score": 0.9}),
            json!({"run_id": 8}),
        ]
        .into_iter()
        .map(|v| ResultRow::from_value(v).run_id().map(str::to_string))
        .collect();
        assert_eq!(
            ids,
            vec![None, None, None, Some("R7".to_string()), Some("8".to_string())]
        );
    }

    #[test]
    fn odd_rows_decode_without_an_id() {
        for v in [
            json!({"run_id": 1.5}),
            json!({"run_id": true}),
            json!({"run_id": ["R1"]}),
            json!(null),
            json!("R1"),
        ] {
            assert_eq!(ResultRow::from_value(v).run_id(), None);
        }
    }
}
