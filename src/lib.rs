//! Resumable chunked uploads to a remote large-object service.
//!
//! Splits a file into fixed-size parts, uploads each part through the
//! Upload-Session Service, persists per-part progress in a durable local
//! store, and finalizes the remote object once every part succeeds. An
//! interrupted upload resumes without re-sending confirmed parts.
//!
//! ```no_run
//! use resumable_upload::{
//!     FileSource, HttpUploadService, SqliteSessionStore, UploadConfig,
//!     UploadCoordinator, UploadRequest,
//! };
//!
//! # async fn run() -> resumable_upload::UploadResult<()> {
//! let store = SqliteSessionStore::connect("uploads.db").await?;
//! let remote = HttpUploadService::new("https://files.example.com")?;
//! let coordinator = UploadCoordinator::new(store, remote, UploadConfig::default());
//!
//! let source = FileSource::open("video.mp4").await?;
//! let request = UploadRequest {
//!     file_name: "video.mp4".into(),
//!     content_type: "video/mp4".into(),
//!     owner_id: "user-1".into(),
//!     destination_folder_id: None,
//! };
//! coordinator
//!     .begin(&source, request, &|progress| {
//!         println!("{}/{} parts", progress.uploaded_parts, progress.total_parts);
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod remote;
pub mod retry;
pub mod source;
pub mod store;

pub use config::UploadConfig;
pub use coordinator::{UploadCoordinator, UploadRequest};
pub use errors::{UploadError, UploadResult};
pub use models::progress::{UploadProgress, UploadStatus};
pub use models::session::{UploadPart, UploadSession};
pub use remote::{FinalizeRequest, HttpUploadService, PartUploadTarget, RemoteSession, UploadService};
pub use retry::BackoffPolicy;
pub use source::{BytesSource, FileSource, UploadSource};
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};
