use std::io;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("download returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("cannot write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// A downloaded clip on local disk, deleted when dropped.
#[derive(Debug)]
pub struct TempVideo {
    path: PathBuf,
}

impl TempVideo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, logging the outcome.
    pub fn remove(mut self) {
        remove_file(&self.path);
        self.path = PathBuf::new();
    }
}

impl Drop for TempVideo {
    fn drop(&mut self) {
        if !self.path.as_os_str().is_empty() {
            remove_file(&self.path);
        }
    }
}

fn remove_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("removed temporary file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove temporary file {}: {}", path.display(), e),
    }
}

/// Stream `url` into `dest`. Returns the number of bytes written.
pub async fn fetch(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64, DownloadError> {
    info!("downloading {url}");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            status,
            url: url.to_string(),
        });
    }

    let io_err = |source| DownloadError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let progress = match response.content_length() {
        Some(len) => {
            let bar = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
            {
                bar.set_style(style.progress_chars("##-"));
            }
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = File::create(dest).await.map_err(io_err)?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
        progress.set_position(written);
    }
    file.flush().await.map_err(io_err)?;
    progress.finish_and_clear();

    info!("downloaded {} bytes to {}", written, dest.display());
    Ok(written)
}
