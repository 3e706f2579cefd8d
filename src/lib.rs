pub mod config;
pub mod fetch;
pub mod history;
pub mod pipeline;
pub mod publish;
pub mod search;
pub mod selector;

pub use config::{Config, ConfigError, Credentials};
pub use history::{HistoryRecord, HistoryStore};
pub use pipeline::{preview, run, RunReport};
pub use publish::{Publisher, TokenProvider, UploadMetadata, YoutubePublisher};
pub use selector::{select, Selection, SelectionError};
