//! Error taxonomy for the upload coordinator.
//!
//! Transient per-part failures are absorbed by the retry loop and never
//! surface individually; only retry exhaustion, session start failure, or
//! finalize failure reach the caller, each carrying enough context (file
//! name, session id, part number) to render a message and resume safely.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The source file reported zero bytes; there is nothing to upload.
    #[error("file `{0}` is empty")]
    EmptyFile(String),

    /// Opening a remote large-object session failed. Never retried
    /// internally; the caller may simply call `begin` again.
    #[error("failed to start upload session for `{file_name}`: {reason}")]
    SessionStart { file_name: String, reason: String },

    /// One part failed on every attempt. Parts uploaded before this one
    /// remain marked uploaded in the stored session, so a later resume
    /// continues from here.
    #[error(
        "part {part_number} of `{file_name}` failed after {attempts} attempts \
         (session `{session_id}`): {reason}"
    )]
    ExhaustedRetries {
        file_name: String,
        session_id: String,
        part_number: u32,
        attempts: u32,
        reason: String,
    },

    /// Committing the assembled remote object failed. The session is left
    /// intact with every part still marked uploaded; a retry only needs to
    /// re-attempt finalize, never the data transfer.
    #[error("failed to finalize upload `{session_id}` for `{file_name}`: {reason}")]
    Finalize {
        session_id: String,
        file_name: String,
        reason: String,
    },

    /// The Upload-Session Service answered with a non-success status.
    #[error("upload service returned {status} for {operation}")]
    RemoteStatus { operation: &'static str, status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A stored session record could not be decoded.
    #[error("corrupt session record `{session_id}`: {reason}")]
    CorruptRecord { session_id: String, reason: String },
}

pub type UploadResult<T> = Result<T, UploadError>;
