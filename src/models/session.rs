//! Represents resumable upload sessions and their parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single fixed-size chunk of the source file.
///
/// `checksum` and `uploaded` are only ever set together, after the remote
/// service has acknowledged receipt of exactly these bytes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadPart {
    /// Part number (1-based).
    pub part_number: u32,

    /// Lowercase hex SHA-1 of the part bytes, computed at upload time.
    pub checksum: Option<String>,

    /// True only after the remote service confirmed this exact part.
    pub uploaded: bool,
}

impl UploadPart {
    fn pending(part_number: u32) -> Self {
        Self {
            part_number,
            checksum: None,
            uploaded: false,
        }
    }

    /// Record a confirmed upload. Checksum and flag move together.
    pub fn mark_uploaded(&mut self, checksum: String) {
        self.checksum = Some(checksum);
        self.uploaded = true;
    }
}

/// One resumable upload: the unit of work the coordinator drives.
///
/// The id is derived deterministically from the file's fingerprint, so the
/// same file re-selected by the same owner resolves to the same session.
/// The parts list is fixed at creation; only per-part checksum/uploaded
/// fields and the advisory cursor mutate afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadSession {
    /// Fingerprint-derived identifier (see `fingerprint`).
    pub id: String,

    /// Large-object id issued by the Upload-Session Service.
    pub remote_object_id: String,

    /// Object name as the remote service recorded it.
    pub remote_object_name: String,

    /// Original file name.
    pub file_name: String,

    /// Total file size in bytes, fixed at creation.
    pub file_size: u64,

    /// MIME type, fixed at creation.
    pub content_type: String,

    /// User who initiated the upload; sessions are scoped per owner.
    pub owner_id: String,

    /// Logical destination folder once the object is finalized.
    pub destination_folder_id: Option<String>,

    /// Part size this session was created with. Resume always uses this
    /// value, never the coordinator's current configuration, so part
    /// boundaries stay stable across config changes.
    pub part_size: u64,

    /// Ordered parts, length `ceil(file_size / part_size)`.
    pub parts: Vec<UploadPart>,

    /// Index of the next part to attempt. Advisory only; the authoritative
    /// truth is each part's `uploaded` flag.
    pub cursor: u32,

    /// Timestamp when the upload was first started.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last persisted state change.
    pub last_updated_at: DateTime<Utc>,
}

impl UploadSession {
    /// Build a fresh session with every part pending.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        remote_object_id: String,
        remote_object_name: String,
        file_name: String,
        file_size: u64,
        content_type: String,
        owner_id: String,
        destination_folder_id: Option<String>,
        part_size: u64,
    ) -> Self {
        let total_parts = file_size.div_ceil(part_size) as u32;
        let now = Utc::now();
        Self {
            id,
            remote_object_id,
            remote_object_name,
            file_name,
            file_size,
            content_type,
            owner_id,
            destination_folder_id,
            part_size,
            parts: (1..=total_parts).map(UploadPart::pending).collect(),
            cursor: 0,
            created_at: now,
            last_updated_at: now,
        }
    }

    pub fn total_parts(&self) -> u32 {
        self.parts.len() as u32
    }

    pub fn uploaded_parts(&self) -> u32 {
        self.parts.iter().filter(|p| p.uploaded).count() as u32
    }

    /// Hard precondition for finalize.
    pub fn all_uploaded(&self) -> bool {
        self.parts.iter().all(|p| p.uploaded)
    }

    /// Byte range `[offset, offset + len)` of a 1-based part number.
    /// The final part may be shorter than `part_size`.
    pub fn part_range(&self, part_number: u32) -> (u64, u64) {
        debug_assert!(
            (1..=self.total_parts()).contains(&part_number),
            "part number {} out of range 1..={}",
            part_number,
            self.total_parts()
        );
        let offset = u64::from(part_number - 1) * self.part_size;
        let len = self.part_size.min(self.file_size - offset);
        (offset, len)
    }

    /// Ordered checksums for finalize. `None` while any part is pending.
    pub fn part_checksums(&self) -> Option<Vec<String>> {
        self.parts.iter().map(|p| p.checksum.clone()).collect()
    }

    /// Stamp a state change before persisting.
    pub fn touch(&mut self) {
        self.last_updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(file_size: u64, part_size: u64) -> UploadSession {
        UploadSession::new(
            "id".into(),
            "remote".into(),
            "name".into(),
            "file.bin".into(),
            file_size,
            "application/octet-stream".into(),
            "owner".into(),
            None,
            part_size,
        )
    }

    #[test]
    fn part_count_rounds_up() {
        // 25 MB file with 10 MB parts: 10 + 10 + 5.
        let s = session(25 * 1024 * 1024, 10 * 1024 * 1024);
        assert_eq!(s.total_parts(), 3);
        assert_eq!(s.part_range(1), (0, 10 * 1024 * 1024));
        assert_eq!(s.part_range(2), (10 * 1024 * 1024, 10 * 1024 * 1024));
        assert_eq!(s.part_range(3), (20 * 1024 * 1024, 5 * 1024 * 1024));
    }

    #[test]
    fn exact_multiple_has_no_stub_part() {
        let s = session(20, 10);
        assert_eq!(s.total_parts(), 2);
        assert_eq!(s.part_range(2), (10, 10));
    }

    #[test]
    fn single_small_file_is_one_part() {
        let s = session(3, 10);
        assert_eq!(s.total_parts(), 1);
        assert_eq!(s.part_range(1), (0, 3));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn part_range_rejects_part_number_zero() {
        session(25, 10).part_range(0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn part_range_rejects_part_number_past_the_end() {
        session(25, 10).part_range(4);
    }

    #[test]
    fn checksums_incomplete_until_every_part_uploaded() {
        let mut s = session(20, 10);
        assert!(s.part_checksums().is_none());
        s.parts[0].mark_uploaded("aa".into());
        assert!(!s.all_uploaded());
        assert!(s.part_checksums().is_none());
        s.parts[1].mark_uploaded("bb".into());
        assert!(s.all_uploaded());
        assert_eq!(s.part_checksums().unwrap(), vec!["aa", "bb"]);
    }
}
