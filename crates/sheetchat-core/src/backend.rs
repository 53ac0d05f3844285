//! HTTP client for the spreadsheet chat backend.
//!
//! Three endpoints hang off the configured base URL:
//! - `POST /upload_file/` takes a multipart body with one `file` field and
//!   answers `{ "room_id": ... }`
//! - `POST /query/` takes `{ "query", "room_id" }` and answers `{ "answer": ... }`
//! - `GET /` is a liveness check answering `{ "message": ... }`

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::files::FileCandidate;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("sheetchat/", env!("CARGO_PKG_VERSION"));

const UPLOAD_PATH: &str = "/upload_file/";
const QUERY_PATH: &str = "/query/";
const FILE_FIELD: &str = "file";

/// Error categories for backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Non-success HTTP status
    HttpStatus,
    /// Request exceeded the configured deadline
    Timeout,
    /// Connection refused, DNS failure, reset, ...
    Transport,
    /// Response body was not what we expected
    Parse,
    /// Reading the local file failed before sending
    Io,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::HttpStatus => write!(f, "http_status"),
            BackendErrorKind::Timeout => write!(f, "timeout"),
            BackendErrorKind::Transport => write!(f, "transport"),
            BackendErrorKind::Parse => write!(f, "parse"),
            BackendErrorKind::Io => write!(f, "io"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Creates an HTTP status error, pulling a readable reason out of the
    /// JSON body when the backend sent one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let reason = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                ["error", "message", "detail"]
                    .iter()
                    .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
            });

        let message = match reason {
            Some(reason) if !reason.trim().is_empty() => format!("HTTP {status}: {}", reason.trim()),
            _ => format!("HTTP {status}"),
        };

        let error = Self::new(BackendErrorKind::HttpStatus, message);
        if body.is_empty() {
            error
        } else {
            error.with_details(body)
        }
    }

    /// Classifies a transport fault. The reqwest description (plus its root
    /// cause) is part of `message` so notices can show it.
    fn from_reqwest(what: &str, err: &reqwest::Error) -> Self {
        let description = describe(err);
        let (kind, message) = if err.is_timeout() {
            (
                BackendErrorKind::Timeout,
                format!("{what} request timed out: {description}"),
            )
        } else if err.is_connect() {
            (
                BackendErrorKind::Transport,
                format!("{what} connection failed: {description}"),
            )
        } else {
            (
                BackendErrorKind::Transport,
                format!("{what} request failed: {description}"),
            )
        };
        Self::new(kind, message).with_details(format!("{err:?}"))
    }
}

/// Error text followed by its innermost cause, when that adds anything.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let text = err.to_string();
    let mut root = err.source();
    while let Some(next) = root.and_then(|cause| cause.source()) {
        root = Some(next);
    }
    match root.map(ToString::to_string) {
        Some(cause) if !text.contains(&cause) => format!("{text}: {cause}"),
        _ => text,
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendError {}

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub room_id: String,
    /// Free-form status line from the backend, if any.
    pub message: Option<String>,
}

/// Successful query response. `answer` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryReply {
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    room_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    room_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    message: Option<String>,
}

/// The two calls the session flow needs from a backend.
pub trait SessionBackend {
    /// Sends the file as a single multipart body and returns the issued room id.
    fn upload(&self, file: &FileCandidate)
    -> impl Future<Output = BackendResult<UploadReceipt>> + Send;

    /// Asks one question scoped to `room_id`.
    fn query(
        &self,
        room_id: &str,
        query: &str,
    ) -> impl Future<Output = BackendResult<QueryReply>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url`. A `timeout` puts a deadline on every request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        Self::new(&base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Checks that the backend is reachable and returns its status line.
    pub async fn health(&self) -> BackendResult<String> {
        let url = self.url("/");
        debug!(%url, "health check");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest("Health", &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::http_status(status.as_u16(), &body));
        }

        let payload: HealthResponse = response.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Parse, "Failed to decode health response")
                .with_details(e.to_string())
        })?;
        Ok(payload
            .message
            .unwrap_or_else(|| "Backend is running".to_string()))
    }
}

impl SessionBackend for HttpBackend {
    async fn upload(&self, file: &FileCandidate) -> BackendResult<UploadReceipt> {
        let bytes = file.read_bytes().await.map_err(|e| {
            warn!(file = %file.name, error = %e, "file not sent");
            BackendError::new(BackendErrorKind::Io, format!("Failed to read {}: {e}", file.name))
        })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                BackendError::new(
                    BackendErrorKind::Parse,
                    format!("Invalid MIME type {}", file.mime_type),
                )
                .with_details(e.to_string())
            })?;
        let form = reqwest::multipart::Form::new().part(FILE_FIELD, part);

        let url = self.url(UPLOAD_PATH);
        debug!(%url, file = %file.name, size = file.size_bytes, "uploading file");
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest("Upload", &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "upload rejected");
            return Err(BackendError::http_status(status.as_u16(), &body));
        }

        let payload: UploadResponse = response.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Parse, "Failed to decode upload response")
                .with_details(e.to_string())
        })?;

        let room_id = payload
            .room_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BackendError::new(BackendErrorKind::Parse, "Upload response missing room_id")
            })?;

        Ok(UploadReceipt {
            room_id,
            message: payload.message,
        })
    }

    async fn query(&self, room_id: &str, query: &str) -> BackendResult<QueryReply> {
        let url = self.url(QUERY_PATH);
        debug!(%url, %room_id, "sending query");
        let response = self
            .http
            .post(url)
            .json(&QueryRequest { query, room_id })
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest("Query", &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %room_id, "query rejected");
            return Err(BackendError::http_status(status.as_u16(), &body));
        }

        let payload: QueryResponse = response.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Parse, "Failed to decode query response")
                .with_details(e.to_string())
        })?;
        Ok(QueryReply {
            answer: payload.answer,
        })
    }
}
