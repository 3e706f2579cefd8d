pub mod auth;

use std::path::Path;

use log::info;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{UploadConfig, FALLBACK_TITLE_SUFFIX, MAX_TITLE_CHARS};
pub use auth::{CredentialError, TokenProvider};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("upload failed: {0}")]
    Transmission(String),
    #[error("cannot read {path}: {source}")]
    Payload {
        path: String,
        source: std::io::Error,
    },
}

/// Everything sent alongside the video bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub language: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

impl UploadMetadata {
    /// Metadata for a Short titled after `title`; everything else is fixed
    /// by `cfg`.
    pub fn for_short(cfg: &UploadConfig, title: &str) -> Self {
        Self {
            title: build_title(&cfg.title_prefix, title),
            description: cfg.description.clone(),
            tags: cfg.tags.clone(),
            category_id: cfg.category_id.clone(),
            language: cfg.language.clone(),
            privacy_status: cfg.privacy_status.clone(),
            made_for_kids: cfg.made_for_kids,
        }
    }
}

/// Something that takes a local video and makes it public somewhere.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    /// Upload `video` and return the id the platform assigned to it.
    async fn publish(&mut self, video: &Path, metadata: &UploadMetadata) -> Result<String, PublishError>;
}

/// Compose `prefix + title`, clamped to [`MAX_TITLE_CHARS`] characters.
///
/// The prefix is always kept; only the title part is cut. Runs of whitespace
/// collapse to a single space. A blank `title` becomes
/// [`FALLBACK_TITLE_SUFFIX`]: titles from the selector are never blank, but
/// `UploadMetadata::for_short` is public and takes any string.
pub fn build_title(prefix: &str, title: &str) -> String {
    let mut suffix = collapse_whitespace(title);
    if suffix.is_empty() {
        suffix = FALLBACK_TITLE_SUFFIX.to_string();
    }

    let budget = MAX_TITLE_CHARS.saturating_sub(prefix.chars().count());
    let truncated: String = suffix.chars().take(budget).collect();

    collapse_whitespace(&format!("{prefix}{truncated}"))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// MIME type for a video file, by extension.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("webm") => "video/webm",
        _ => "video/mp4",
    }
}

#[derive(Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
    default_language: &'a str,
    default_audio_language: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

impl<'a> From<&'a UploadMetadata> for VideoResource<'a> {
    fn from(m: &'a UploadMetadata) -> Self {
        Self {
            snippet: Snippet {
                title: &m.title,
                description: &m.description,
                tags: &m.tags,
                category_id: &m.category_id,
                default_language: &m.language,
                default_audio_language: &m.language,
            },
            status: Status {
                privacy_status: &m.privacy_status,
                self_declared_made_for_kids: m.made_for_kids,
            },
        }
    }
}

#[derive(Deserialize)]
struct UploadedVideo {
    id: String,
}

/// YouTube Data API v3 publisher using the resumable upload protocol.
///
/// The upload happens in two round-trips:
///
/// 1. POST the video resource JSON to the upload endpoint. The `Location`
///    header of the response is the session URI.
/// 2. PUT the raw bytes to the session URI. The response body is the created
///    video resource, whose `id` is returned.
pub struct YoutubePublisher {
    client: reqwest::Client,
    tokens: TokenProvider,
    upload_endpoint: String,
}

impl YoutubePublisher {
    pub fn new(client: reqwest::Client, tokens: TokenProvider, upload_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            tokens,
            upload_endpoint: upload_endpoint.into(),
        }
    }

    async fn start_session(
        &self,
        token: &str,
        metadata: &UploadMetadata,
        mime: &str,
        size: u64,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(&self.upload_endpoint)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("X-Upload-Content-Type", mime)
            .header("X-Upload-Content-Length", size.to_string())
            .json(&VideoResource::from(metadata))
            .send()
            .await
            .map_err(|e| PublishError::Transmission(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upload_failure("upload initiation", status, body));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .ok_or_else(|| {
                PublishError::Transmission(
                    "no Location header in upload-initiation response; check that the token has \
                     the youtube.upload scope"
                        .into(),
                )
            })
    }

    async fn send_bytes(
        &self,
        session_uri: &str,
        video: &Path,
        mime: &str,
        size: u64,
    ) -> Result<String, PublishError> {
        let file = tokio::fs::File::open(video)
            .await
            .map_err(|source| PublishError::Payload {
                path: video.display().to_string(),
                source,
            })?;

        let response = self
            .client
            .put(session_uri)
            .header(CONTENT_TYPE, mime)
            .header(CONTENT_LENGTH, size)
            .body(file)
            .send()
            .await
            .map_err(|e| PublishError::Transmission(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PublishError::Transmission(e.to_string()))?;
        if !status.is_success() {
            return Err(upload_failure("video upload", status, body));
        }

        let video: UploadedVideo = serde_json::from_str(&body).map_err(|e| {
            PublishError::Transmission(format!("could not parse video id from upload response: {e}"))
        })?;
        Ok(video.id)
    }
}

impl Publisher for YoutubePublisher {
    async fn publish(&mut self, video: &Path, metadata: &UploadMetadata) -> Result<String, PublishError> {
        let size = tokio::fs::metadata(video)
            .await
            .map_err(|source| PublishError::Payload {
                path: video.display().to_string(),
                source,
            })?
            .len();
        let mime = mime_type(video);

        let token = self.tokens.access_token().await?;

        info!("video title: {} ({} chars)", metadata.title, metadata.title.chars().count());
        let session_uri = self.start_session(&token, metadata, mime, size).await?;
        info!("uploading {} bytes ({mime})", size);
        self.send_bytes(&session_uri, video, mime, size).await
    }
}

fn upload_failure(stage: &str, status: StatusCode, body: String) -> PublishError {
    if status == StatusCode::UNAUTHORIZED
        || body.contains("Invalid Credentials")
        || body.contains("invalid_grant")
    {
        return CredentialError::Rejected(format!("{stage} returned {status}")).into();
    }
    PublishError::Transmission(format!("{stage} returned {status}: {body}"))
}
