pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod error;
pub mod progress;
pub mod resolver;
pub mod segmenter;
pub mod storage;
pub mod stream;
pub mod url_model;

pub use control::CancelToken;
pub use downloader::{download, DownloadOutcome, DownloadRequest};
pub use error::DownloadError;
pub use progress::ProgressStats;
