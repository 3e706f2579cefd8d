use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use pixshorts::config::{
    DEFAULT_HISTORY_FILE, DEFAULT_LANGUAGE, DEFAULT_QUERY, DEFAULT_SEARCH_ENDPOINT,
    DEFAULT_TEMP_VIDEO_FILE, DEFAULT_TOKEN_ENDPOINT, DEFAULT_UPLOAD_ENDPOINT,
};
use pixshorts::config::search_api_key_from_env;
use pixshorts::{pipeline, Config, Credentials, HistoryStore, TokenProvider, YoutubePublisher};

/// pixshorts: publish a random vertical stock clip as a YouTube Short.
#[derive(Parser)]
#[command(name = "pixshorts", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, download, upload and record one clip
    Run(RunArgs),

    /// Search and pick a clip without downloading or uploading it
    Preview(RunArgs),

    /// List clips that were already published
    History {
        /// Upload history file
        #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
        history: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Search query
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    query: String,

    /// Search and upload language
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Upload history file
    #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
    history: PathBuf,

    /// Where the clip is downloaded before upload
    #[arg(long, default_value = DEFAULT_TEMP_VIDEO_FILE)]
    temp_file: PathBuf,

    /// Directory searched for a client_secret*.json file
    #[arg(long, default_value = ".")]
    secrets_dir: PathBuf,

    /// Video search endpoint
    #[arg(long, default_value = DEFAULT_SEARCH_ENDPOINT)]
    search_endpoint: String,

    /// OAuth2 token endpoint
    #[arg(long, default_value = DEFAULT_TOKEN_ENDPOINT)]
    token_endpoint: String,

    /// Video upload endpoint
    #[arg(long, default_value = DEFAULT_UPLOAD_ENDPOINT)]
    upload_endpoint: String,
}

impl RunArgs {
    fn into_config(self) -> Result<Config> {
        let api_key = search_api_key_from_env().context("missing search API key")?;

        let mut cfg = Config::new(api_key);
        cfg.search.query = self.query;
        cfg.search.language = self.lang.clone();
        cfg.search.endpoint = self.search_endpoint;
        cfg.upload.language = self.lang;
        cfg.upload.token_endpoint = self.token_endpoint;
        cfg.upload.upload_endpoint = self.upload_endpoint;
        cfg.history_path = self.history;
        cfg.temp_video_path = self.temp_file;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        debug!("loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .user_agent(concat!("pixshorts/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    match cli.command {
        Commands::Run(args) => {
            let credentials = Credentials::from_env(&args.secrets_dir)
                .context("missing or invalid credentials")?;
            debug!("credentials: {credentials:?}");
            let cfg = args.into_config()?;
            let tokens = TokenProvider::new(client.clone(), &cfg.upload.token_endpoint, &credentials);
            let mut publisher =
                YoutubePublisher::new(client.clone(), tokens, &cfg.upload.upload_endpoint);

            let report =
                pipeline::run(&cfg, &client, &mut publisher, &mut rand::thread_rng()).await?;

            println!("Upload successful! Video ID: {}", report.video_id);
            println!("Video URL: {}", report.watch_url());
            if !report.history_saved {
                eprintln!(
                    "warning: {} was not updated; this clip may be picked again",
                    cfg.history_path.display()
                );
            }
        }

        Commands::Preview(args) => {
            let cfg = args.into_config()?;
            let selection = pipeline::preview(&cfg, &client, &mut rand::thread_rng()).await?;
            println!("Title:  {}", selection.title);
            println!("Source: {}", selection.source_url);
            println!("Video:  {}", selection.download_url);
            println!(
                "Size:   {}x{}{}",
                selection.width,
                selection.height,
                if selection.is_vertical() { " (vertical)" } else { "" }
            );
        }

        Commands::History { history } => {
            let store = HistoryStore::new(history);
            let records = store
                .try_load()
                .with_context(|| format!("cannot read {}", store.path().display()))?;
            info!("{} uploads recorded", records.len());
            for r in records {
                let when = r
                    .uploaded_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}  {}  {}", when, r.video_id, r.url);
            }
        }
    }

    Ok(())
}
