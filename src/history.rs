//! Data handed to history/export collaborators.
//!
//! The toolkit only produces these records after each read, write, or
//! lock outcome; persistence belongs to the caller behind
//! [`HistorySink`].

use crate::transport::TagInfo;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Read,
    Write,
    Format,
    Lock,
    Clone,
    Emulate,
}

/// Flat record appended after each tag operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub tag_id: Option<String>,
    pub tag_type: Option<String>,
    pub action: ActionKind,
    pub title: String,
    pub description: String,
    /// Raw payload bytes, base64 encoded.
    pub raw_payload: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(
        action: ActionKind,
        title: impl Into<String>,
        description: impl Into<String>,
        payload: &[u8],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag_id: None,
            tag_type: None,
            action,
            title: title.into(),
            description: description.into(),
            raw_payload: BASE64.encode(payload),
            timestamp: Utc::now(),
        }
    }

    pub fn with_tag(mut self, info: &TagInfo) -> Self {
        self.tag_id = Some(info.id_hex());
        self.tag_type = Some(info.tag_type.to_string());
        self
    }

    /// Decode the stored payload back to bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.raw_payload)
    }
}

/// Caller-implemented persistence seam.
pub trait HistorySink {
    fn append(&mut self, record: HistoryRecord);
}

/// Export records as pretty-printed JSON.
pub fn export_json(records: &[HistoryRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Export records as CSV with quoted text fields.
pub fn export_csv(records: &[HistoryRecord]) -> String {
    let mut out = String::from("ID,Tag ID,Tag Type,Action,Title,Description,Timestamp\n");
    for record in records {
        let action = serde_plain_action(record.action);
        out.push_str(&format!(
            "{},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{}\n",
            record.id,
            record.tag_id.as_deref().unwrap_or(""),
            record.tag_type.as_deref().unwrap_or(""),
            action,
            csv_escape(&record.title),
            csv_escape(&record.description),
            record.timestamp.to_rfc3339(),
        ));
    }
    out
}

fn csv_escape(field: &str) -> String {
    field.replace('"', "\"\"")
}

fn serde_plain_action(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Read => "READ",
        ActionKind::Write => "WRITE",
        ActionKind::Format => "FORMAT",
        ActionKind::Lock => "LOCK",
        ActionKind::Clone => "CLONE",
        ActionKind::Emulate => "EMULATE",
    }
}
