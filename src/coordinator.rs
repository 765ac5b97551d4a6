//! The resumable upload coordinator.
//!
//! Drives one file from "not started" to "finalized remote object",
//! tolerating interruption at any point. Parts are uploaded strictly
//! sequentially in ascending order; each confirmed part is persisted
//! immediately, so a crash loses at most one part's progress. Finalize is
//! only attempted once every part is confirmed, and the local session
//! record is deleted only after a successful finalize or an explicit
//! cancel — resumability is the default outcome of failure.

use crate::config::UploadConfig;
use crate::errors::{UploadError, UploadResult};
use crate::fingerprint::fingerprint;
use crate::models::progress::{UploadProgress, UploadStatus};
use crate::models::session::UploadSession;
use crate::remote::{FinalizeRequest, UploadService};
use crate::retry::retry;
use crate::source::UploadSource;
use crate::store::SessionStore;
use futures::StreamExt;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

/// Static facts about the file being uploaded, supplied by the caller.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub owner_id: String,
    pub destination_folder_id: Option<String>,
}

/// Coordinates resumable uploads against a session store and the
/// Upload-Session Service. One logical task per file; multiple files may
/// run concurrently through [`UploadCoordinator::upload_all`], which caps
/// simultaneous uploads at `config.max_concurrent_files`.
pub struct UploadCoordinator<S, R> {
    store: S,
    remote: R,
    config: UploadConfig,
}

impl<S, R> UploadCoordinator<S, R>
where
    S: SessionStore,
    R: UploadService,
{
    pub fn new(store: S, remote: R, config: UploadConfig) -> Self {
        Self {
            store,
            remote,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Start (or transparently resume) the upload of one file.
    ///
    /// Computes the file's fingerprint and reuses an unfinished session for
    /// the same (owner, fingerprint, size) when one exists; otherwise opens
    /// a new remote session and persists a fresh record before any part is
    /// sent. Either way, continues with the shared part-upload procedure.
    pub async fn begin<F>(
        &self,
        source: &impl UploadSource,
        request: UploadRequest,
        on_progress: &F,
    ) -> UploadResult<()>
    where
        F: Fn(UploadProgress),
    {
        if source.size() == 0 {
            return Err(UploadError::EmptyFile(request.file_name));
        }

        let session = match self.find_pending(source, &request.file_name, &request.owner_id).await?
        {
            Some(existing) => {
                info!(
                    session_id = %existing.id,
                    uploaded = existing.uploaded_parts(),
                    total = existing.total_parts(),
                    "resuming existing upload session"
                );
                existing
            }
            None => self.open_session(source, &request).await?,
        };

        self.upload_parts(source, session, on_progress).await
    }

    /// Continue an upload from a session obtained via [`find_pending`] or
    /// [`list_pending`]. Shares the part-upload procedure with `begin`.
    ///
    /// [`find_pending`]: UploadCoordinator::find_pending
    /// [`list_pending`]: UploadCoordinator::list_pending
    pub async fn resume<F>(
        &self,
        source: &impl UploadSource,
        session: UploadSession,
        on_progress: &F,
    ) -> UploadResult<()>
    where
        F: Fn(UploadProgress),
    {
        self.upload_parts(source, session, on_progress).await
    }

    /// Look up an unfinished session for this exact file.
    ///
    /// Recomputes the fingerprint and returns a match only when owner and
    /// size agree. A changed file with the same name, size, and leading
    /// bytes as a stale session is indistinguishable from the original;
    /// that is an accepted limitation of the fingerprint scheme.
    pub async fn find_pending(
        &self,
        source: &impl UploadSource,
        file_name: &str,
        owner_id: &str,
    ) -> UploadResult<Option<UploadSession>> {
        let id = self.fingerprint_source(source, file_name).await?;
        Ok(self
            .store
            .get(&id)
            .await?
            .filter(|s| s.owner_id == owner_id && s.file_size == source.size()))
    }

    /// All locally stored sessions for an owner. No network calls.
    pub async fn list_pending(&self, owner_id: &str) -> UploadResult<Vec<UploadSession>> {
        self.store.list_by_owner(owner_id).await
    }

    /// Abandon an upload. The local record is removed unconditionally; the
    /// remote service is told to discard the partial object, but failing to
    /// reach it does not block local removal.
    pub async fn cancel(&self, session_id: &str) -> UploadResult<()> {
        if let Some(session) = self.store.get(session_id).await? {
            if let Err(err) = self.remote.cancel(&session.remote_object_id).await {
                warn!(
                    session_id,
                    remote_object_id = %session.remote_object_id,
                    "remote cancel failed, removing local record anyway: {}",
                    err
                );
            }
            self.store.delete(session_id).await?;
            info!(session_id, "upload cancelled");
        }
        Ok(())
    }

    /// Drop every stored session for an owner without touching the remote
    /// service. Local bookkeeping reset only.
    pub async fn clear_pending(&self, owner_id: &str) -> UploadResult<()> {
        self.store.clear_owner(owner_id).await
    }

    /// Upload several files, at most `config.max_concurrent_files` at a
    /// time. Parts within each file remain strictly sequential; cross-file
    /// ordering (and the order of returned results) is unspecified.
    pub async fn upload_all<Src, F>(
        &self,
        jobs: Vec<(Src, UploadRequest)>,
        on_progress: &F,
    ) -> Vec<UploadResult<()>>
    where
        Src: UploadSource,
        F: Fn(UploadProgress),
    {
        futures::stream::iter(
            jobs.into_iter()
                .map(|(source, request)| async move {
                    self.begin(&source, request, on_progress).await
                }),
        )
        .buffer_unordered(self.config.max_concurrent_files)
        .collect()
        .await
    }

    /// Fingerprint a source: name + size + hash of the leading bytes.
    async fn fingerprint_source(
        &self,
        source: &impl UploadSource,
        file_name: &str,
    ) -> UploadResult<String> {
        let head_len = self.config.fingerprint_prefix.min(source.size());
        let head = source.read_range(0, head_len).await?;
        Ok(fingerprint(file_name, source.size(), &head))
    }

    /// Open a remote session and persist a fresh all-pending record.
    async fn open_session(
        &self,
        source: &impl UploadSource,
        request: &UploadRequest,
    ) -> UploadResult<UploadSession> {
        let id = self.fingerprint_source(source, &request.file_name).await?;
        let remote = self
            .remote
            .start_session(&request.file_name, &request.content_type)
            .await
            .map_err(|err| UploadError::SessionStart {
                file_name: request.file_name.clone(),
                reason: err.to_string(),
            })?;

        let session = UploadSession::new(
            id,
            remote.remote_object_id,
            remote.remote_object_name,
            request.file_name.clone(),
            source.size(),
            request.content_type.clone(),
            request.owner_id.clone(),
            request.destination_folder_id.clone(),
            self.config.part_size,
        );
        self.store.put(&session).await?;
        info!(
            session_id = %session.id,
            remote_object_id = %session.remote_object_id,
            parts = session.total_parts(),
            "opened upload session"
        );
        Ok(session)
    }

    /// Shared part-upload procedure: skip confirmed parts, upload the rest
    /// in ascending order with retry, persist after every success, then
    /// finalize and delete the local record.
    async fn upload_parts<F>(
        &self,
        source: &impl UploadSource,
        mut session: UploadSession,
        on_progress: &F,
    ) -> UploadResult<()>
    where
        F: Fn(UploadProgress),
    {
        let remote_object_id = session.remote_object_id.clone();

        for index in 0..session.parts.len() {
            if session.parts[index].uploaded {
                debug!(
                    session_id = %session.id,
                    part_number = session.parts[index].part_number,
                    "part already uploaded, skipping"
                );
                continue;
            }

            session.cursor = index as u32;
            on_progress(snapshot(&session, UploadStatus::Uploading, None));

            let part_number = session.parts[index].part_number;
            let (offset, len) = session.part_range(part_number);

            // A fresh upload target is fetched inside the retried closure:
            // targets may be single-use or short-lived, so a failed attempt
            // must not reuse the previous one. The checksum is computed from
            // the exact bytes submitted, on every attempt.
            let remote = &self.remote;
            let remote_id = remote_object_id.clone();
            let attempt = move || {
                let remote_id = remote_id.clone();
                async move {
                    let target = remote.part_upload_target(&remote_id).await?;
                    let bytes = source.read_range(offset, len).await?;
                    let checksum = sha1_hex(&bytes);
                    remote
                        .upload_part(&target, part_number, &checksum, bytes)
                        .await?;
                    Ok::<_, UploadError>(checksum)
                }
            };

            let outcome = retry(self.config.max_attempts, self.config.backoff, attempt).await;
            match outcome {
                Ok(checksum) => {
                    session.parts[index].mark_uploaded(checksum);
                    session.cursor = index as u32 + 1;
                    session.touch();
                    self.store.put(&session).await?;
                    debug!(
                        session_id = %session.id,
                        part_number,
                        uploaded = session.uploaded_parts(),
                        total = session.total_parts(),
                        "part uploaded"
                    );
                    on_progress(snapshot(&session, UploadStatus::Uploading, None));
                }
                Err((err, attempts)) => {
                    let reason = err.to_string();
                    on_progress(snapshot(
                        &session,
                        UploadStatus::Error,
                        Some(format!("part {} failed after {} attempts", part_number, attempts)),
                    ));
                    return Err(UploadError::ExhaustedRetries {
                        file_name: session.file_name,
                        session_id: session.id,
                        part_number,
                        attempts,
                        reason,
                    });
                }
            }
        }

        self.finalize(session, on_progress).await
    }

    /// Commit the object. Every part is confirmed uploaded at this point;
    /// on failure the session keeps all parts marked uploaded so a retry
    /// only re-attempts finalize.
    async fn finalize<F>(&self, session: UploadSession, on_progress: &F) -> UploadResult<()>
    where
        F: Fn(UploadProgress),
    {
        let checksums = session
            .part_checksums()
            .ok_or_else(|| UploadError::CorruptRecord {
                session_id: session.id.clone(),
                reason: "finalize reached with a pending part".into(),
            })?;

        let request = FinalizeRequest {
            remote_object_id: session.remote_object_id.clone(),
            part_checksums: checksums,
            file_name: session.file_name.clone(),
            file_size: session.file_size,
            content_type: session.content_type.clone(),
            destination_folder_id: session.destination_folder_id.clone(),
            owner_id: session.owner_id.clone(),
        };

        if let Err(err) = self.remote.finalize(&request).await {
            let reason = err.to_string();
            on_progress(snapshot(
                &session,
                UploadStatus::Error,
                Some(format!("finalize failed: {}", reason)),
            ));
            return Err(UploadError::Finalize {
                session_id: session.id,
                file_name: session.file_name,
                reason,
            });
        }

        self.store.delete(&session.id).await?;
        info!(
            session_id = %session.id,
            remote_object_id = %session.remote_object_id,
            "upload finalized"
        );
        on_progress(snapshot(&session, UploadStatus::Complete, None));
        Ok(())
    }
}

/// Progress snapshot for the callback. Bytes are estimated as completed
/// parts times part size, capped at the file size.
fn snapshot(session: &UploadSession, status: UploadStatus, error: Option<String>) -> UploadProgress {
    let total_parts = session.total_parts();
    let uploaded_parts = session.uploaded_parts();
    let percent = if total_parts == 0 {
        100.0
    } else {
        f64::from(uploaded_parts) / f64::from(total_parts) * 100.0
    };
    UploadProgress {
        upload_id: session.id.clone(),
        file_name: session.file_name.clone(),
        total_parts,
        uploaded_parts,
        percent_complete: percent.round() as u8,
        bytes_uploaded: (u64::from(uploaded_parts) * session.part_size).min(session.file_size),
        total_bytes: session.file_size,
        status,
        error,
    }
}

/// Lowercase hex SHA-1, the per-part checksum the remote service verifies.
fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_matches_known_vector() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }
}
