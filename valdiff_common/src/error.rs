use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// A mapping key whose category has no defined equality.
    #[error("Invalid map key type: {ty}")]
    UnsupportedKey { ty: String },
}

pub type Result<T> = std::result::Result<T, ValDiffError>;
