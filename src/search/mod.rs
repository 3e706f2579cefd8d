use std::collections::BTreeMap;

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::config::SearchConfig;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode search response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// One concrete downloadable rendition of a [`Candidate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Encoding {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

impl Encoding {
    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }
}

/// One media item from the search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub id: u64,
    /// Source page URL; identifies the clip in the upload history.
    #[serde(rename = "pageURL")]
    pub page_url: String,
    pub tags: String,
    /// Renditions keyed by quality name (`large`, `medium`, ...).
    pub videos: BTreeMap<String, Encoding>,
}

impl Candidate {
    /// `true` if any rendition is taller than it is wide.
    pub fn has_vertical_encoding(&self) -> bool {
        self.videos.values().any(Encoding::is_vertical)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    #[serde(rename = "totalHits")]
    total_hits: u64,
    hits: Vec<Candidate>,
}

/// Run one query against the video-search endpoint.
pub async fn search(
    client: &reqwest::Client,
    cfg: &SearchConfig,
    api_key: &str,
) -> Result<Vec<Candidate>, SearchError> {
    info!("searching for \"{}\" ({})", cfg.query, cfg.language);

    let safe_search = if cfg.safe_search { "true" } else { "false" };
    let response = client
        .get(&cfg.endpoint)
        .query(&[
            ("key", api_key),
            ("q", cfg.query.as_str()),
            ("safesearch", safe_search),
            ("lang", cfg.language.as_str()),
            ("orientation", cfg.orientation.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::Status { status, body });
    }

    let parsed: SearchResponse = response.json().await.map_err(SearchError::Decode)?;
    debug!("search matched {} clips in total", parsed.total_hits);
    info!("search returned {} candidates", parsed.hits.len());
    Ok(parsed.hits)
}
