//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, parsing, search, and manifest errors, and provides
//! semantic variants for argument validation and external tool failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("granule identifier error: {0}")]
    Parse(#[from] crate::granule::ParseError),

    #[error("tile geodesy error: {0}")]
    Tile(#[from] crate::granule::InvalidTileError),

    #[error("archive search error: {0}")]
    Search(#[from] crate::earthdata::SearchError),

    #[error("download error: {0}")]
    Download(#[from] crate::download::DownloadError),

    #[error("manifest error: {0}")]
    Manifest(#[from] crate::manifest::ManifestError),

    #[error("upload error: {0}")]
    Upload(#[from] crate::upload::UploadError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }
}
