use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid log level: {level}. Must be trace, debug, info, warn or error")]
    InvalidLogLevel { level: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ecosync::config::ConfigError),
}
