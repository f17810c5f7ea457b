// src/models/monitoring.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ==================== ACCIDENTS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccidentStatus {
    #[default]
    Active,
    Acknowledged,
    Resolved,
    FalseAlarm,
}

impl AccidentStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, AccidentStatus::Resolved | AccidentStatus::FalseAlarm)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accident {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: AccidentStatus,
    #[serde(default)]
    pub reported_at: String,
    #[serde(default = "default_reporter")]
    pub reported_by: String,
}

fn default_reporter() -> String {
    "system".to_string()
}

/// Verification values the backend stores for a fall event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Acknowledge = 1,
    Resolve = 2,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccidentUpdateRequest {
    pub verification_status: u8,
    pub verify_subject: String,
}

impl AccidentUpdateRequest {
    pub fn new(verification: Verification) -> Self {
        Self {
            verification_status: verification as u8,
            verify_subject: "ui".to_string(),
        }
    }
}

// ==================== SAFETY / MONITORING ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyEnvironmentItem {
    pub key: String,
    pub label: String,
    pub value: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub location: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyStatus {
    #[serde(default)]
    pub environmental: Vec<SafetyEnvironmentItem>,
    #[serde(default)]
    pub alerts: Vec<SafetyAlert>,
    #[serde(default)]
    pub system_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringOverview {
    pub model: String,
    pub last_updated: String,
    pub fps: f64,
}

// ==================== LOGS ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLog {
    pub id: i64,
    pub timestamp: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLog {
    pub id: i64,
    pub sent_time: String,
    pub recipient: String,
    pub recipient_email: String,
    pub incident_type: String,
    pub delivery_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechToken {
    pub token: String,
    pub region: String,
}
