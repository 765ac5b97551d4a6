//! Shared test doubles: a scripted Upload-Session Service that records
//! every call and can be told to fail specific parts, finalize, start, or
//! cancel.

use async_trait::async_trait;
use bytes::Bytes;
use resumable_upload::{
    FinalizeRequest, PartUploadTarget, RemoteSession, UploadError, UploadResult, UploadService,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber once per test binary; honors RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[derive(Clone, Debug)]
pub struct SubmittedPart {
    pub part_number: u32,
    pub checksum: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct RemoteCalls {
    pub starts: u32,
    pub targets: u32,
    pub submits: Vec<SubmittedPart>,
    pub finalizes: Vec<FinalizeRequest>,
    pub cancels: u32,
}

#[derive(Default)]
pub struct MockUploadService {
    pub calls: Mutex<RemoteCalls>,
    /// part number -> remaining forced failures for that part.
    fail_submits: Mutex<HashMap<u32, u32>>,
    fail_start: Mutex<bool>,
    fail_finalize: Mutex<bool>,
    fail_cancel: Mutex<bool>,
    /// When set, every submission sleeps this long so uploads overlap.
    part_delay: Mutex<Option<Duration>>,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

impl MockUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` submissions of `part_number`.
    pub fn fail_part(&self, part_number: u32, times: u32) {
        self.fail_submits
            .lock()
            .unwrap()
            .insert(part_number, times);
    }

    pub fn set_fail_start(&self, fail: bool) {
        *self.fail_start.lock().unwrap() = fail;
    }

    pub fn set_fail_finalize(&self, fail: bool) {
        *self.fail_finalize.lock().unwrap() = fail;
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        *self.fail_cancel.lock().unwrap() = fail;
    }

    pub fn set_part_delay(&self, delay: Duration) {
        *self.part_delay.lock().unwrap() = Some(delay);
    }

    /// Highest number of part submissions ever in flight at once.
    pub fn max_concurrent_submits(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn submits_for(&self, part_number: u32) -> usize {
        self.calls
            .lock()
            .unwrap()
            .submits
            .iter()
            .filter(|s| s.part_number == part_number)
            .count()
    }
}

fn unavailable(operation: &'static str) -> UploadError {
    UploadError::RemoteStatus {
        operation,
        status: 503,
    }
}

#[async_trait]
impl UploadService for MockUploadService {
    async fn start_session(
        &self,
        file_name: &str,
        _content_type: &str,
    ) -> UploadResult<RemoteSession> {
        if *self.fail_start.lock().unwrap() {
            return Err(unavailable("start"));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.starts += 1;
        Ok(RemoteSession {
            remote_object_id: format!("remote-{}", calls.starts),
            remote_object_name: file_name.to_string(),
        })
    }

    async fn part_upload_target(
        &self,
        remote_object_id: &str,
    ) -> UploadResult<PartUploadTarget> {
        let mut calls = self.calls.lock().unwrap();
        calls.targets += 1;
        Ok(PartUploadTarget {
            upload_url: format!("mock://{}/part/{}", remote_object_id, calls.targets),
            authorization_token: format!("token-{}", calls.targets),
        })
    }

    async fn upload_part(
        &self,
        _target: &PartUploadTarget,
        part_number: u32,
        checksum: &str,
        body: Bytes,
    ) -> UploadResult<()> {
        let delay = *self.part_delay.lock().unwrap();
        if let Some(delay) = delay {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        {
            let mut failures = self.fail_submits.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&part_number) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(unavailable("upload-part"));
                }
            }
        }
        self.calls.lock().unwrap().submits.push(SubmittedPart {
            part_number,
            checksum: checksum.to_string(),
            body: body.to_vec(),
        });
        Ok(())
    }

    async fn finalize(&self, request: &FinalizeRequest) -> UploadResult<()> {
        if *self.fail_finalize.lock().unwrap() {
            return Err(unavailable("finish"));
        }
        self.calls.lock().unwrap().finalizes.push(request.clone());
        Ok(())
    }

    async fn cancel(&self, _remote_object_id: &str) -> UploadResult<()> {
        self.calls.lock().unwrap().cancels += 1;
        if *self.fail_cancel.lock().unwrap() {
            return Err(unavailable("cancel"));
        }
        Ok(())
    }
}
