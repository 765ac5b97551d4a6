//! SQLite-backed session store.
//!
//! Sessions live in a single `upload_sessions` table with the parts list
//! serialized as JSON — each `put` upserts the whole record, matching the
//! full-overwrite write model of the store contract. Timestamps are stored
//! as RFC 3339 text.

use crate::errors::{UploadError, UploadResult};
use crate::models::session::UploadSession;
use crate::store::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Raw row shape; parts stay JSON until decoded.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    owner_id: String,
    remote_object_id: String,
    remote_object_name: String,
    file_name: String,
    file_size: i64,
    content_type: String,
    destination_folder_id: Option<String>,
    part_size: i64,
    cursor: i64,
    parts: String,
    created_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> UploadResult<UploadSession> {
        let parts =
            serde_json::from_str(&self.parts).map_err(|err| UploadError::CorruptRecord {
                session_id: self.id.clone(),
                reason: err.to_string(),
            })?;
        Ok(UploadSession {
            id: self.id,
            remote_object_id: self.remote_object_id,
            remote_object_name: self.remote_object_name,
            file_name: self.file_name,
            file_size: self.file_size as u64,
            content_type: self.content_type,
            owner_id: self.owner_id,
            destination_folder_id: self.destination_folder_id,
            part_size: self.part_size as u64,
            parts,
            cursor: self.cursor as u32,
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, owner_id, remote_object_id, remote_object_name, file_name, \
     file_size, content_type, destination_folder_id, part_size, cursor, \
     parts, created_at, last_updated_at";

/// Durable session store backed by a shared SQLite pool.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Arc<SqlitePool>,
}

impl SqliteSessionStore {
    /// Wrap an existing pool. The schema must already be in place
    /// (see [`SqliteSessionStore::migrate`]).
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Open (creating if missing) a database file and apply the schema.
    pub async fn connect(path: impl AsRef<Path>) -> UploadResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self::new(Arc::new(pool));
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the embedded schema, statement by statement.
    pub async fn migrate(&self) -> UploadResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        debug!("applying {} schema statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, id: &str) -> UploadResult<Option<UploadSession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM upload_sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        row.map(SessionRow::into_session).transpose()
    }

    async fn put(&self, session: &UploadSession) -> UploadResult<()> {
        let parts = serde_json::to_string(&session.parts).map_err(|err| {
            UploadError::CorruptRecord {
                session_id: session.id.clone(),
                reason: err.to_string(),
            }
        })?;
        sqlx::query(
            r#"
            INSERT INTO upload_sessions (
                id, owner_id, remote_object_id, remote_object_name, file_name,
                file_size, content_type, destination_folder_id, part_size,
                cursor, parts, created_at, last_updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                remote_object_id = excluded.remote_object_id,
                remote_object_name = excluded.remote_object_name,
                file_name = excluded.file_name,
                file_size = excluded.file_size,
                content_type = excluded.content_type,
                destination_folder_id = excluded.destination_folder_id,
                part_size = excluded.part_size,
                cursor = excluded.cursor,
                parts = excluded.parts,
                created_at = excluded.created_at,
                last_updated_at = excluded.last_updated_at
            "#,
        )
        .bind(&session.id)
        .bind(&session.owner_id)
        .bind(&session.remote_object_id)
        .bind(&session.remote_object_name)
        .bind(&session.file_name)
        .bind(session.file_size as i64)
        .bind(&session.content_type)
        .bind(&session.destination_folder_id)
        .bind(session.part_size as i64)
        .bind(i64::from(session.cursor))
        .bind(&parts)
        .bind(session.created_at)
        .bind(session.last_updated_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> UploadResult<()> {
        sqlx::query("DELETE FROM upload_sessions WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> UploadResult<Vec<UploadSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM upload_sessions \
             WHERE owner_id = ? ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(&*self.db)
        .await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn clear_owner(&self, owner_id: &str) -> UploadResult<()> {
        let result = sqlx::query("DELETE FROM upload_sessions WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&*self.db)
            .await?;
        debug!(
            owner_id,
            removed = result.rows_affected(),
            "cleared pending sessions"
        );
        Ok(())
    }
}
