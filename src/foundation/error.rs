use std::{path::PathBuf, time::Duration};

pub type Goes16Result<T> = Result<T, Goes16Error>;

#[derive(thiserror::Error, Debug)]
pub enum Goes16Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("download error: could not download '{url}' after {attempts} attempt(s): {reason}")]
    Download {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("partial download error: {failed}/{total} tile(s) failed, first failure: {first}")]
    PartialDownload {
        failed: usize,
        total: usize,
        first: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("composite input error: unable to open '{}': {reason}", path.display())]
    CompositeInput { path: PathBuf, reason: String },

    #[error("timeout error: pipeline did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("unsupported environment error: {0}")]
    UnsupportedEnvironment(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Goes16Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn unsupported_environment(msg: impl Into<String>) -> Self {
        Self::UnsupportedEnvironment(msg.into())
    }

    pub fn composite_input(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CompositeInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
