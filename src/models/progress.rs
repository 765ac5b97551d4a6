//! Progress reporting types handed to the caller's callback.

use serde::{Deserialize, Serialize};

/// Coarse status of one upload as reported to callers.
///
/// `Paused` is caller-driven: the coordinator never pauses itself, the
/// variant exists for UIs to show between explicit begin/resume calls.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Paused,
    Complete,
    Error,
}

/// Snapshot of one upload's progress, emitted after every state change.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadProgress {
    /// Session id (the file fingerprint).
    pub upload_id: String,

    /// Original file name, for display.
    pub file_name: String,

    /// Number of parts in the session.
    pub total_parts: u32,

    /// Parts confirmed by the remote service so far.
    pub uploaded_parts: u32,

    /// Whole-number percentage, `uploaded_parts / total_parts`.
    pub percent_complete: u8,

    /// Estimated bytes transferred: completed parts times part size,
    /// capped at the file size (the final part may be short).
    pub bytes_uploaded: u64,

    /// Total file size in bytes.
    pub total_bytes: u64,

    pub status: UploadStatus,

    /// Human-readable failure description when `status == Error`.
    pub error: Option<String>,
}
