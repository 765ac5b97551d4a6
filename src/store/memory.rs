//! In-memory session store, the moral equivalent of the browser-local
//! keyed storage the design came from. Used by tests and short-lived
//! processes that do not need resume across restarts.

use crate::errors::UploadResult;
use crate::models::session::UploadSession;
use crate::store::SessionStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, UploadSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> UploadResult<Option<UploadSession>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn put(&self, session: &UploadSession) -> UploadResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> UploadResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> UploadResult<Vec<UploadSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn clear_owner(&self, owner_id: &str) -> UploadResult<()> {
        self.sessions
            .write()
            .await
            .retain(|_, s| s.owner_id != owner_id);
        Ok(())
    }
}
