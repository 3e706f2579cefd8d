pub mod record;

use anyhow::{Context, Result};
use log::{info, warn};
use rand::Rng;

use crate::config::Config;
use crate::fetch::{self, TempVideo};
use crate::history::HistoryStore;
use crate::publish::{Publisher, UploadMetadata};
use crate::search;
use crate::selector::{self, Selection};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Id assigned by the hosting platform.
    pub video_id: String,
    /// Source page of the clip that was published.
    pub source_url: String,
    /// Final title as uploaded.
    pub title: String,
    /// `false` if the history document could not be updated.
    pub history_saved: bool,
}

impl RunReport {
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.video_id)
    }
}

/// Search, then pick a clip, without downloading anything.
pub async fn preview<R: Rng>(cfg: &Config, client: &reqwest::Client, rng: &mut R) -> Result<Selection> {
    let candidates = search::search(client, &cfg.search, &cfg.api_key)
        .await
        .context("search failed")?;
    let history = HistoryStore::new(&cfg.history_path);
    let selection = selector::select(&candidates, &history, rng).context("selection failed")?;
    Ok(selection)
}

/// Run the whole job: search → select → download → publish → record.
///
/// The temporary download is removed whether or not the upload succeeds.
pub async fn run<P, R>(
    cfg: &Config,
    client: &reqwest::Client,
    publisher: &mut P,
    rng: &mut R,
) -> Result<RunReport>
where
    P: Publisher,
    R: Rng,
{
    info!("searching for videos...");
    let selection = preview(cfg, client, rng).await?;
    info!("selected: {} ({})", selection.title, selection.source_url);

    let temp = TempVideo::new(&cfg.temp_video_path);
    fetch::fetch(client, &selection.download_url, temp.path())
        .await
        .context("download failed")?;
    check_orientation(&selection);

    let metadata = UploadMetadata::for_short(&cfg.upload, &selection.title);
    info!("uploading to YouTube as Short...");
    let video_id = publisher
        .publish(temp.path(), &metadata)
        .await
        .context("upload failed")?;
    info!("upload successful! video id: {video_id}");

    let history = HistoryStore::new(&cfg.history_path);
    let history_saved = record::record(&history, &selection.source_url, &video_id).is_ok();
    temp.remove();

    Ok(RunReport {
        video_id,
        source_url: selection.source_url,
        title: metadata.title,
        history_saved,
    })
}

fn check_orientation(selection: &Selection) {
    if selection.width == 0 || selection.height == 0 {
        return;
    }
    let aspect = selection.width as f64 / selection.height as f64;
    info!(
        "video dimensions: {}x{} (aspect ratio {:.2})",
        selection.width, selection.height, aspect
    );
    if selection.is_vertical() {
        info!("video is vertical, it will be published as a Short");
    } else {
        warn!("video is not vertical; Shorts require a vertical (9:16) format");
    }
}
