use std::fmt;

use serde::{Deserialize, Serialize};

use super::submission::QualificationPayload;

/// Identifier assigned by the storage backend to a delivered qualification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualificationId(pub String);

impl fmt::Display for QualificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkReceipt {
    pub qualification_id: QualificationId,
}

/// Outbound hand-off for packaged qualification payloads.
pub trait SubmissionSink: Send + Sync {
    fn deliver(&self, payload: &QualificationPayload) -> Result<SinkReceipt, SinkError>;
}

/// Delivery failure reported by a sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("qualification storage rejected the submission ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("qualification storage unavailable: {0}")]
    Unavailable(String),
}
