//! Core data models for resumable uploads.
//!
//! These entities describe one in-flight large-file upload and its
//! progress. They persist through the session store via `serde` and map
//! onto the SQLite row layout in `store::sqlite`.

pub mod progress;
pub mod session;
