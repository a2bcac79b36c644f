use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    /// Missing, empty, misaligned or unreadable book file.
    #[error("book '{}' unavailable: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },

    /// A guide book line with a token that does not decode to a legal move.
    #[error("guide book error in line '{line}' at '{token}'")]
    IllegalLine { line: String, token: String },

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("record {index} out of range ({len} records)")]
    RecordOutOfRange { index: usize, len: usize },

    #[error("book store is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("generated table: {0}")]
    Table(#[from] serde_json::Error),
}

impl BookError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BookError::Unavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
