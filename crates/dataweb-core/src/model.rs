//! Feed snapshot types decoded from the block server JSON.
//!
//! One `FeedSnapshot` = one poll response: the active configuration name,
//! the block groups and the instrument PVs. Key order of every JSON object
//! is preserved, so groups, blocks and PVs display in the order the server
//! sent them.

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// String-keyed map that keeps insertion order.
///
/// A repeated key replaces the earlier value in the earlier position.
pub type OrderedMap<T> = IndexMap<String, T>;

/// Status text the block server reports for a PV it cannot reach.
pub const DISCONNECTED_STATUS: &str = "Disconnected";

/// Placeholder the block server uses for missing values and alarms.
pub const NULL_TEXT: &str = "null";

// ============================================================
// Snapshot
// ============================================================

/// Top-level feed payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedSnapshot {
    /// Name of the active instrument configuration.
    #[serde(default)]
    pub config_name: String,
    /// Group name → block name → state, in server order.
    #[serde(default)]
    pub groups: OrderedMap<OrderedMap<FieldState>>,
    /// Instrument PV key → state, including the `DISPLAY` privacy switch.
    #[serde(default, rename = "inst_pvs")]
    pub instrument_fields: OrderedMap<FieldState>,
}

impl FeedSnapshot {
    /// Decodes a snapshot from the feed JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decodes a snapshot from raw feed bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Total number of fields (blocks + instrument PVs) in the snapshot.
    pub fn field_count(&self) -> usize {
        let blocks: usize = self.groups.values().map(|blocks| blocks.len()).sum();
        blocks + self.instrument_fields.len()
    }
}

// ============================================================
// Field state
// ============================================================

/// Connection state of a single PV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
}

impl From<Option<String>> for ConnectionStatus {
    fn from(status: Option<String>) -> Self {
        match status.as_deref() {
            Some(DISCONNECTED_STATUS) => ConnectionStatus::Disconnected,
            _ => ConnectionStatus::Connected,
        }
    }
}

/// Current reading of one block or instrument PV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldState {
    /// Reading as text. `"null"` when the server has no value.
    #[serde(default = "null_text", alias = "values", deserialize_with = "text_or_null")]
    pub value: String,
    #[serde(default, rename = "status", alias = "status_text")]
    pub connection_status: ConnectionStatus,
    /// Alarm description; `"null…"` / `"OK…"` mean no alarm.
    #[serde(
        default = "null_text",
        rename = "alarm",
        alias = "alarms",
        deserialize_with = "text_or_null"
    )]
    pub alarm_text: String,
}

impl FieldState {
    pub fn connected(value: impl Into<String>, alarm_text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            connection_status: ConnectionStatus::Connected,
            alarm_text: alarm_text.into(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            value: NULL_TEXT.to_string(),
            connection_status: ConnectionStatus::Disconnected,
            alarm_text: NULL_TEXT.to_string(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }
}

fn null_text() -> String {
    NULL_TEXT.to_string()
}

/// Accepts any JSON scalar as text: strings verbatim, `null` as `"null"`,
/// numbers and booleans in their JSON spelling.
fn text_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => null_text(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
