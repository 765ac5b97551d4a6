//! Byte-range access to the local file being uploaded.
//!
//! The coordinator only ever needs two reads: the leading bytes for the
//! fingerprint and the exact range of each part. Keeping that behind a
//! trait lets tests drive uploads from memory.

use crate::errors::UploadResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Total size in bytes. Must not change while an upload is running.
    fn size(&self) -> u64;

    /// Read exactly `[offset, offset + len)`. `len` is clamped by the
    /// caller to the file size; short reads are an error.
    async fn read_range(&self, offset: u64, len: u64) -> UploadResult<Bytes>;
}

/// A local file on disk. Opens a fresh handle per read so the source stays
/// shareable across concurrent uploads without seek-position state.
pub struct FileSource {
    path: PathBuf,
    size: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> UploadResult<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path).await?;
        Ok(Self {
            path,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: u64, len: u64) -> UploadResult<Bytes> {
        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

/// In-memory source, used by tests and for already-buffered payloads.
#[derive(Clone)]
pub struct BytesSource {
    data: Bytes,
}

impl BytesSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl UploadSource for BytesSource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&self, offset: u64, len: u64) -> UploadResult<Bytes> {
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "range {}..{} beyond {} bytes",
                        offset,
                        offset.saturating_add(len),
                        self.data.len()
                    ),
                )
            })?;
        Ok(self.data.slice(start..end))
    }
}
