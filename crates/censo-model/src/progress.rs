//! Progress events read by the caller's progress UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: ProgressLevel,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(session_id: impl Into<String>, level: ProgressLevel, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}
