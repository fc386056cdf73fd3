//! Access-log record types.
//!
//! This module defines the record written for every accepted code detection
//! at the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of code that produced an access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeType {
    /// A QR code decoded from a camera frame.
    #[serde(rename = "QRCODE")]
    Qr,
}

impl std::fmt::Display for CodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qr => write!(f, "QRCODE"),
        }
    }
}

/// A single accepted detection, as stored in the access log.
///
/// Events are append-only: they are never updated or deleted by this tool,
/// and no uniqueness is enforced on the code value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// The decoded code payload.
    pub code_value: String,

    /// The kind of code that was detected.
    pub code_type: CodeType,

    /// When the detection was accepted.
    pub timestamp: DateTime<Utc>,
}

impl AccessEvent {
    /// Create a QR access event stamped with the current time.
    #[must_use]
    pub fn qr(code_value: impl Into<String>) -> Self {
        Self {
            id: None,
            code_value: code_value.into(),
            code_type: CodeType::Qr,
            timestamp: Utc::now(),
        }
    }
}
