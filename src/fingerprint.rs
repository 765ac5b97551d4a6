//! File fingerprinting for resume matching.
//!
//! A fingerprint identifies "the same file" across separate upload attempts
//! so an unfinished session can be found again. It hashes only the leading
//! bytes of the file (1 MiB by default) together with name and size — a
//! deliberate speed/collision tradeoff inherited from the service contract:
//! two files sharing name, size, and an identical first segment are
//! indistinguishable. `find_pending` additionally checks owner and size.

use sha2::{Digest, Sha256};

/// How many hex characters of the content hash end up in the fingerprint.
const HASH_PREFIX_LEN: usize = 16;

/// Derive the stable session identifier for a file.
///
/// `head` must be the file's leading bytes (up to the configured prefix
/// length; the whole file when it is smaller). Pure function; the same
/// inputs always produce the same id.
pub fn fingerprint(file_name: &str, file_size: u64, head: &[u8]) -> String {
    let digest = Sha256::digest(head);
    let hash_hex = hex::encode(digest);
    format!(
        "{}_{}_{}",
        file_name,
        file_size,
        &hash_hex[..HASH_PREFIX_LEN]
    )
}
