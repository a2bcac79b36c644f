use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BookError;
use crate::pieces::Color;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub book: BookFileConfig,
    pub internal: InternalBookConfig,
    /// Books are not consulted past this many plies from the start.
    pub max_ply: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            book: BookFileConfig::default(),
            internal: InternalBookConfig::default(),
            max_ply: 32,
        }
    }
}

impl BookConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, BookError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, BookError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookFileConfig {
    /// Main book file; relative names go through the book search path.
    pub file: Option<PathBuf>,
    pub default_dir: PathBuf,
    /// Books smaller than this are read into memory on open.
    pub memory_limit_mb: usize,
    /// Moves weighted below this percentage of the best move are not played.
    pub filter_percent: u32,
}

impl Default for BookFileConfig {
    fn default() -> Self {
        Self {
            file: None,
            default_dir: PathBuf::from("books"),
            memory_limit_mb: 64,
            filter_percent: 20,
        }
    }
}

impl BookFileConfig {
    pub fn memory_limit_records(&self) -> usize {
        self.memory_limit_mb.saturating_mul(1024 * 1024) / crate::book_file::RECORD_SIZE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalSource {
    /// Lines compiled into the binary.
    Embedded,
    /// A text file with one annotated line per row.
    Lines(PathBuf),
    /// A table previously written by `InternalBook::write_table`.
    Table(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InternalBookConfig {
    pub enabled: bool,
    pub source: InternalSource,
    /// Moves played by this side are not recorded.
    pub excluded_color: Option<Color>,
}

impl Default for InternalBookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: InternalSource::Embedded,
            excluded_color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BookConfig::from_toml_str("").unwrap();
        assert_eq!(config, BookConfig::default());
        assert_eq!(config.book.filter_percent, 20);
        assert_eq!(config.book.memory_limit_records(), 64 * 1024 * 1024 / 16);
        assert_eq!(config.internal.source, InternalSource::Embedded);
    }

    #[test]
    fn parses_all_sections() {
        let text = r#"
            max_ply = 12

            [book]
            file = "performance.bin"
            default_dir = "/opt/books"
            memory_limit_mb = 8
            filter_percent = 35

            [internal]
            enabled = true
            source = { table = "guide.json" }
            excluded_color = "black"
        "#;
        let config = BookConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_ply, 12);
        assert_eq!(config.book.file, Some(PathBuf::from("performance.bin")));
        assert_eq!(config.book.default_dir, PathBuf::from("/opt/books"));
        assert_eq!(config.book.filter_percent, 35);
        assert_eq!(config.book.memory_limit_records(), 8 * 65536);
        assert_eq!(
            config.internal.source,
            InternalSource::Table(PathBuf::from("guide.json"))
        );
        assert_eq!(config.internal.excluded_color, Some(Color::Black));
    }

    #[test]
    fn rejects_bad_types() {
        assert!(matches!(
            BookConfig::from_toml_str("max_ply = \"many\""),
            Err(BookError::Config(_))
        ));
    }
}
