mod credentials;

use std::path::PathBuf;

pub use credentials::{search_api_key, search_api_key_from_env, ConfigError, Credentials};

// Search parameters
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://pixabay.com/api/videos/";
pub const DEFAULT_QUERY: &str = "funny dogs";
pub const DEFAULT_LANGUAGE: &str = "de";
pub const SEARCH_ORIENTATION: &str = "vertical";

// YouTube endpoints
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
pub const OAUTH_PLAYGROUND_URL: &str = "https://developers.google.com/oauthplayground/";

// Local files
pub const DEFAULT_HISTORY_FILE: &str = "uploaded-videos.json";
pub const DEFAULT_TEMP_VIDEO_FILE: &str = "temp-video.mp4";

// Title rules
pub const MAX_TITLE_CHARS: usize = 100;
pub const TITLE_PREFIX: &str = "#shorts #dog ";
pub const FALLBACK_TITLE: &str = "Untitled Short";
pub const FALLBACK_TITLE_SUFFIX: &str = "Cute Dog Video";

// Fixed upload metadata
pub const DESCRIPTION: &str = "#Shorts #CuteAnimals #Dogs #Cats #PetVideos";
pub const TAGS: [&str; 6] = ["shorts", "dog", "cute", "animals", "pets", "funny"];
pub const CATEGORY_ID: &str = "15"; // Pets & Animals
pub const PRIVACY_STATUS: &str = "public";

/// Parameters for the stock-video search request.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub query: String,
    pub language: String,
    pub safe_search: bool,
    pub orientation: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            query: DEFAULT_QUERY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            safe_search: true,
            orientation: SEARCH_ORIENTATION.to_string(),
        }
    }
}

/// Where and how a clip is published.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub token_endpoint: String,
    pub upload_endpoint: String,
    pub title_prefix: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub language: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            title_prefix: TITLE_PREFIX.to_string(),
            description: DESCRIPTION.to_string(),
            tags: TAGS.iter().map(|t| t.to_string()).collect(),
            category_id: CATEGORY_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            privacy_status: PRIVACY_STATUS.to_string(),
            made_for_kids: false,
        }
    }
}

/// Runtime configuration for one pipeline run.
///
/// Built once in `main` and passed by reference to every stage. OAuth
/// secrets are not part of it; they live in the [`Publisher`](crate::Publisher).
#[derive(Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub upload: UploadConfig,
    pub api_key: String,
    pub history_path: PathBuf,
    pub temp_video_path: PathBuf,
}

impl Config {
    /// Default settings around the given search key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            search: SearchConfig::default(),
            upload: UploadConfig::default(),
            api_key: api_key.into(),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            temp_video_path: PathBuf::from(DEFAULT_TEMP_VIDEO_FILE),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("search", &self.search)
            .field("upload", &self.upload)
            .field("api_key", &"<redacted>")
            .field("history_path", &self.history_path)
            .field("temp_video_path", &self.temp_video_path)
            .finish()
    }
}
