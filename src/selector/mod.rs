use std::collections::HashSet;

use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::config::FALLBACK_TITLE;
use crate::history::HistorySource;
use crate::search::{Candidate, Encoding};

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("no videos found")]
    EmptyResult,
    #[error(
        "no new videos found: all {total} videos from this search have already been uploaded. \
         Try a different search query or wait for new videos"
    )]
    AllCandidatesExhausted { total: usize },
    #[error("no downloadable rendition for {source_url}")]
    NoDownloadableEncoding { source_url: String },
}

/// The clip chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub download_url: String,
    pub title: String,
    pub source_url: String,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }
}

/// Pick one unpublished candidate, preferring vertical clips, and its best
/// rendition.
///
/// History is only consulted once `candidates` is known to be non-empty.
pub fn select<H, R>(
    candidates: &[Candidate],
    history: &H,
    rng: &mut R,
) -> Result<Selection, SelectionError>
where
    H: HistorySource + ?Sized,
    R: Rng,
{
    if candidates.is_empty() {
        return Err(SelectionError::EmptyResult);
    }

    let published: HashSet<String> = history
        .records()
        .into_iter()
        .map(|r| r.url)
        .filter(|url| !url.is_empty())
        .collect();
    info!("already uploaded: {} videos", published.len());

    let unpublished: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.page_url.is_empty() || !published.contains(&c.page_url))
        .collect();
    let vertical: Vec<&Candidate> = unpublished
        .iter()
        .copied()
        .filter(|c| c.has_vertical_encoding())
        .collect();

    let pool = if !vertical.is_empty() {
        vertical
    } else if !unpublished.is_empty() {
        debug!("no vertical candidates left, falling back to any orientation");
        unpublished
    } else {
        return Err(SelectionError::AllCandidatesExhausted {
            total: candidates.len(),
        });
    };
    info!("found {} new videos to choose from", pool.len());

    let chosen = pool[rng.gen_range(0..pool.len())];
    let encoding = best_encoding(chosen).ok_or_else(|| SelectionError::NoDownloadableEncoding {
        source_url: chosen.page_url.clone(),
    })?;

    Ok(Selection {
        download_url: encoding.url.clone(),
        title: derive_title(&chosen.tags),
        source_url: chosen.page_url.clone(),
        width: encoding.width,
        height: encoding.height,
    })
}

/// Highest-ranked rendition with a URL: vertical first, then largest file.
pub fn best_encoding(candidate: &Candidate) -> Option<&Encoding> {
    let mut ranked: Vec<(&String, &Encoding)> = candidate
        .videos
        .iter()
        .filter(|(_, e)| !e.url.trim().is_empty())
        .collect();
    ranked.sort_by(|(key_a, a), (key_b, b)| {
        b.is_vertical()
            .cmp(&a.is_vertical())
            .then(b.size.cmp(&a.size))
            .then(key_a.cmp(key_b))
    });
    ranked.first().map(|(_, e)| *e)
}

/// Turn a comma-separated tag string into a display title.
///
/// `"dog, funny, cute"` becomes `"dog funny cute"`. Feeding the output back in
/// returns it unchanged.
pub fn derive_title(tags: &str) -> String {
    let mut title = tags.to_string();
    while title.contains(", ") {
        title = title.replace(", ", " ");
    }
    let title = title.trim();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }
}
