//! Durable local state store for upload sessions.
//!
//! Resume bookkeeping only: one record per session id, written only by the
//! coordinator that owns that session, each write a full overwrite of the
//! record. The backing medium is swappable behind `SessionStore`.

use crate::errors::UploadResult;
use crate::models::session::UploadSession;
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Keyed repository of `UploadSession` records.
///
/// Implementations must tolerate an empty store on first run, and a `get`
/// or `delete` of an unknown id is not an error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> UploadResult<Option<UploadSession>>;

    /// Insert or fully overwrite the record with this session's id.
    async fn put(&self, session: &UploadSession) -> UploadResult<()>;

    async fn delete(&self, id: &str) -> UploadResult<()>;

    async fn list_by_owner(&self, owner_id: &str) -> UploadResult<Vec<UploadSession>>;

    /// Remove every session for one owner. Local bookkeeping only; the
    /// remote service is not told.
    async fn clear_owner(&self, owner_id: &str) -> UploadResult<()>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    async fn get(&self, id: &str) -> UploadResult<Option<UploadSession>> {
        (**self).get(id).await
    }

    async fn put(&self, session: &UploadSession) -> UploadResult<()> {
        (**self).put(session).await
    }

    async fn delete(&self, id: &str) -> UploadResult<()> {
        (**self).delete(id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> UploadResult<Vec<UploadSession>> {
        (**self).list_by_owner(owner_id).await
    }

    async fn clear_owner(&self, owner_id: &str) -> UploadResult<()> {
        (**self).clear_owner(owner_id).await
    }
}
