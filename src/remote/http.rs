//! HTTP implementation of the Upload-Session Service contract.
//!
//! Talks to the application's large-file endpoints:
//!
//! - `POST {base}/api/files/large-file/start`    — open a session
//! - `POST {base}/api/files/large-file/part-url` — fresh per-part target
//! - `POST {base}/api/files/large-file/finish`   — commit the object
//! - `POST {base}/api/files/large-file/cancel`   — discard a partial object
//!
//! Part bytes go straight to the issued `uploadUrl` with the token in the
//! `Authorization` header plus `X-Part-Number` and `X-Content-Sha1`.

use crate::errors::{UploadError, UploadResult};
use crate::remote::{FinalizeRequest, PartUploadTarget, RemoteSession, UploadService};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const HEADER_PART_NUMBER: &str = "x-part-number";
pub const HEADER_CONTENT_SHA1: &str = "x-content-sha1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartBody<'a> {
    file_name: &'a str,
    content_type: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    file_id: String,
    file_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileIdBody<'a> {
    file_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartUrlResponse {
    upload_url: String,
    authorization_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinishBody<'a> {
    file_id: &'a str,
    part_sha1_array: &'a [String],
    file_name: &'a str,
    file_size: u64,
    content_type: &'a str,
    folder_id: Option<&'a str>,
    user_id: &'a str,
}

/// Upload-Session Service client over HTTP.
#[derive(Clone, Debug)]
pub struct HttpUploadService {
    client: Client,
    base_url: String,
}

impl HttpUploadService {
    pub fn new(base_url: impl Into<String>) -> UploadResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a caller-supplied client (custom timeouts, proxies, ...).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/files/large-file/{}", self.base_url, path)
    }

    /// POST a JSON body and decode a JSON response, mapping non-2xx to
    /// `RemoteStatus`.
    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        url: &str,
        body: &B,
    ) -> UploadResult<R> {
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(UploadError::RemoteStatus {
                operation,
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn start_session(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> UploadResult<RemoteSession> {
        let response: StartResponse = self
            .post_json(
                "start",
                &self.endpoint("start"),
                &StartBody {
                    file_name,
                    content_type,
                },
            )
            .await?;
        Ok(RemoteSession {
            remote_object_id: response.file_id,
            remote_object_name: response.file_name,
        })
    }

    async fn part_upload_target(
        &self,
        remote_object_id: &str,
    ) -> UploadResult<PartUploadTarget> {
        let response: PartUrlResponse = self
            .post_json(
                "part-url",
                &self.endpoint("part-url"),
                &FileIdBody {
                    file_id: remote_object_id,
                },
            )
            .await?;
        Ok(PartUploadTarget {
            upload_url: response.upload_url,
            authorization_token: response.authorization_token,
        })
    }

    async fn upload_part(
        &self,
        target: &PartUploadTarget,
        part_number: u32,
        checksum: &str,
        body: Bytes,
    ) -> UploadResult<()> {
        let response = self
            .client
            .post(&target.upload_url)
            .header(
                reqwest::header::AUTHORIZATION,
                target.authorization_token.as_str(),
            )
            .header(HEADER_PART_NUMBER, part_number)
            .header(HEADER_CONTENT_SHA1, checksum)
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UploadError::RemoteStatus {
                operation: "upload-part",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn finalize(&self, request: &FinalizeRequest) -> UploadResult<()> {
        let response = self
            .client
            .post(self.endpoint("finish"))
            .json(&FinishBody {
                file_id: &request.remote_object_id,
                part_sha1_array: &request.part_checksums,
                file_name: &request.file_name,
                file_size: request.file_size,
                content_type: &request.content_type,
                folder_id: request.destination_folder_id.as_deref(),
                user_id: &request.owner_id,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UploadError::RemoteStatus {
                operation: "finish",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn cancel(&self, remote_object_id: &str) -> UploadResult<()> {
        let response = self
            .client
            .post(self.endpoint("cancel"))
            .json(&FileIdBody {
                file_id: remote_object_id,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UploadError::RemoteStatus {
                operation: "cancel",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
