use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FfbfError {
    /// A required file, stream or memory region could not be opened, read,
    /// written or mapped.
    #[error("{op} failed{}: {source}", display_path(.path))]
    Resource {
        op: &'static str,
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Corrupt filter cache: {0}")]
    Corrupt(String),
}

impl FfbfError {
    pub fn resource(op: &'static str, source: std::io::Error) -> Self {
        FfbfError::Resource { op, path: None, source }
    }

    pub fn resource_at(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FfbfError::Resource { op, path: Some(path.into()), source }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" for {}", p.display()),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, FfbfError>;
