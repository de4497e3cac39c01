//! Blocking HTTP client for the KIT Intel API.

use kitintel_protocol::defaults::{API_KEY_HEADER, UPLOAD_CONTENT_TYPE};
use kitintel_protocol::{
    ContentRequest, ContentResponse, SearchRequest, SearchResponse, SubmitRequest, SubmitResponse,
};
use kitintel_submit::{
    ContentDigest, RemoteError, RemoteIndexClient, RemoteSubmissionClient, UploadPayload,
    UploadSlot,
};
use reqwest::blocking::{Body, Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigError, KitConfig};

/// Authenticated client bound to one API endpoint.
pub struct KitApiClient {
    http: Client,
    /// Presigned URLs: no API key, no overall timeout.
    upload_http: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl KitApiClient {
    /// Fails with [`ConfigError::MissingApiKey`] when no key is configured.
    pub fn new(config: &KitConfig) -> Result<Self, ClientInitError> {
        let api_key = config.require_api_key()?.to_string();
        let http = Client::builder().timeout(config.timeout).build()?;
        let upload_http = Client::builder().timeout(None::<std::time::Duration>).build()?;
        Ok(Self {
            http,
            upload_http,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `POST /search`, returning the raw response document.
    pub fn search(&self, request: &SearchRequest) -> Result<Value, RemoteError> {
        self.post_json("search", request)
    }

    /// `POST /search`, keeping only the fields the client interprets.
    pub fn search_typed(&self, request: &SearchRequest) -> Result<SearchResponse, RemoteError> {
        self.post_json("search", request)
    }

    /// Fetch the stored artifact for `uuid`: resolve its download URL, then GET it.
    pub fn content(&self, uuid: &str) -> Result<String, RemoteError> {
        let located: ContentResponse = self.post_json(
            "content",
            &ContentRequest {
                uuid: uuid.to_string(),
            },
        )?;
        debug!(uuid, "Downloading artifact");
        let response = self
            .upload_http
            .get(&located.download_url)
            .send()
            .map_err(transport)?;
        check_status(response)?.text().map_err(decode)
    }

    fn post_json<B, T>(&self, route: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, route);
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .map_err(transport)?;
        check_status(response)?.json().map_err(decode)
    }
}

impl RemoteIndexClient for KitApiClient {
    fn count_matches(&self, digest: &ContentDigest) -> Result<u64, RemoteError> {
        let response = self.search_typed(&SearchRequest::kit_by_sha256(&digest.to_hex()))?;
        Ok(response.match_count())
    }
}

impl RemoteSubmissionClient for KitApiClient {
    fn request_upload_slot(&self, file_name: &str) -> Result<UploadSlot, RemoteError> {
        let response: SubmitResponse = self.post_json(
            "submit",
            &SubmitRequest {
                file_name: file_name.to_string(),
            },
        )?;
        Ok(UploadSlot {
            url: response.upload_url,
        })
    }

    fn stream_upload(&self, slot: &UploadSlot, payload: UploadPayload) -> Result<(), RemoteError> {
        debug!(kit = %payload.file_name, bytes = payload.len, "PUT upload slot");
        let response = self
            .upload_http
            .put(&slot.url)
            .header(CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .body(Body::sized(payload.reader, payload.len))
            .send()
            .map_err(transport)?;
        check_status(response).map(drop)
    }
}

fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(classify_status(status, body))
}

/// Map a non-success status to a [`RemoteError`].
pub fn classify_status(status: StatusCode, body: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::PermissionDenied,
        _ => RemoteError::UnexpectedStatus {
            status: status.as_u16(),
            body: truncate_body(body),
        },
    }
}

fn truncate_body(body: String) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> RemoteError {
    RemoteError::Decode(err.to_string())
}
