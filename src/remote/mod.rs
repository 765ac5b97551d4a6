//! Contract with the Upload-Session Service.
//!
//! The service opens a large-object session, hands out short-lived per-part
//! upload targets, commits the assembled object, and can discard a partial
//! one. The coordinator treats it as a plain request/response collaborator;
//! `http` implements the contract over HTTP.

use crate::errors::UploadResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpUploadService;

/// Remote identifiers returned when a session is opened.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RemoteSession {
    pub remote_object_id: String,
    pub remote_object_name: String,
}

/// Where and with what credential to send one part.
///
/// Targets are assumed single-use and short-lived: the coordinator fetches
/// a fresh one for every part and never caches them across parts.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PartUploadTarget {
    pub upload_url: String,
    pub authorization_token: String,
}

/// Everything finalize needs to commit the object.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FinalizeRequest {
    pub remote_object_id: String,
    /// Checksums in part order; length equals the session's part count.
    pub part_checksums: Vec<String>,
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub destination_folder_id: Option<String>,
    pub owner_id: String,
}

#[async_trait]
pub trait UploadService: Send + Sync {
    /// Open a new large-object session.
    async fn start_session(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> UploadResult<RemoteSession>;

    /// Fetch a fresh upload target for the next part.
    async fn part_upload_target(&self, remote_object_id: &str)
    -> UploadResult<PartUploadTarget>;

    /// Submit one part's bytes. Success means the remote service has
    /// acknowledged receipt of exactly these bytes under this checksum.
    async fn upload_part(
        &self,
        target: &PartUploadTarget,
        part_number: u32,
        checksum: &str,
        body: Bytes,
    ) -> UploadResult<()>;

    /// Commit every uploaded part into one addressable object.
    async fn finalize(&self, request: &FinalizeRequest) -> UploadResult<()>;

    /// Discard a partial remote object. Best-effort from the caller's
    /// point of view; errors are logged and ignored.
    async fn cancel(&self, remote_object_id: &str) -> UploadResult<()>;
}

#[async_trait]
impl<T: UploadService + ?Sized> UploadService for std::sync::Arc<T> {
    async fn start_session(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> UploadResult<RemoteSession> {
        (**self).start_session(file_name, content_type).await
    }

    async fn part_upload_target(
        &self,
        remote_object_id: &str,
    ) -> UploadResult<PartUploadTarget> {
        (**self).part_upload_target(remote_object_id).await
    }

    async fn upload_part(
        &self,
        target: &PartUploadTarget,
        part_number: u32,
        checksum: &str,
        body: Bytes,
    ) -> UploadResult<()> {
        (**self)
            .upload_part(target, part_number, checksum, body)
            .await
    }

    async fn finalize(&self, request: &FinalizeRequest) -> UploadResult<()> {
        (**self).finalize(request).await
    }

    async fn cancel(&self, remote_object_id: &str) -> UploadResult<()> {
        (**self).cancel(remote_object_id).await
    }
}
