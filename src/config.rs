use crate::retry::BackoffPolicy;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Default part size: 10 MiB, the unit of transfer to the remote service.
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Default attempt ceiling for a single part (first try + retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff base; doubles after each failed attempt.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Soft cap on files uploading simultaneously in batch mode.
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 3;

/// How much of the head of a file feeds the fingerprint hash: 1 MiB.
pub const DEFAULT_FINGERPRINT_PREFIX: u64 = 1024 * 1024;

/// Centralized coordinator configuration.
/// `Default` gives the production values; `from_env` lets deployments
/// override individual knobs without code changes.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Fixed byte size of every part except the final one.
    pub part_size: u64,

    /// Attempts per part before the whole operation fails.
    pub max_attempts: u32,

    /// Backoff between attempts on the same part.
    pub backoff: BackoffPolicy,

    /// Soft cap on concurrently uploading files (`upload_all`).
    pub max_concurrent_files: usize,

    /// Number of leading bytes hashed into the file fingerprint.
    pub fingerprint_prefix: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffPolicy::exponential(DEFAULT_BACKOFF_BASE),
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            fingerprint_prefix: DEFAULT_FINGERPRINT_PREFIX,
        }
    }
}

impl UploadConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `UPLOAD_PART_SIZE`, `UPLOAD_MAX_ATTEMPTS`,
    /// `UPLOAD_BACKOFF_BASE_MS`, `UPLOAD_MAX_CONCURRENT_FILES`,
    /// `UPLOAD_FINGERPRINT_PREFIX`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let part_size = parse_var("UPLOAD_PART_SIZE", defaults.part_size)?;
        let max_attempts = parse_var("UPLOAD_MAX_ATTEMPTS", defaults.max_attempts)?;
        let backoff_base_ms = parse_var(
            "UPLOAD_BACKOFF_BASE_MS",
            DEFAULT_BACKOFF_BASE.as_millis() as u64,
        )?;
        let max_concurrent_files =
            parse_var("UPLOAD_MAX_CONCURRENT_FILES", defaults.max_concurrent_files)?;
        let fingerprint_prefix =
            parse_var("UPLOAD_FINGERPRINT_PREFIX", defaults.fingerprint_prefix)?;

        anyhow::ensure!(part_size > 0, "UPLOAD_PART_SIZE must be positive");
        anyhow::ensure!(max_attempts > 0, "UPLOAD_MAX_ATTEMPTS must be positive");
        anyhow::ensure!(
            max_concurrent_files > 0,
            "UPLOAD_MAX_CONCURRENT_FILES must be positive"
        );

        Ok(Self {
            part_size,
            max_attempts,
            backoff: BackoffPolicy::exponential(Duration::from_millis(backoff_base_ms)),
            max_concurrent_files,
            fingerprint_prefix,
        })
    }
}

/// Read and parse one environment variable, using `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).context(format!("reading {}", name)),
    }
}
