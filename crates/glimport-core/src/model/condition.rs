// ── Status conditions ──
//
// Kubernetes-style `status.conditions[]` entries as reported by the
// provider controller on observed resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Tri-state condition status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A single named status condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl Condition {
    /// Placeholder for a condition the resource does not report yet.
    pub fn unknown(type_: &str) -> Self {
        Self {
            type_: type_.to_owned(),
            ..Self::default()
        }
    }

    /// Read one entry leniently: unknown status strings become `Unknown`,
    /// missing messages become empty.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let type_ = value.get("type")?.as_str()?.to_owned();
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .map(String::from);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Some(Self {
            type_,
            status,
            reason,
            message,
        })
    }

    pub fn is_false(&self) -> bool {
        self.status == ConditionStatus::False
    }
}
