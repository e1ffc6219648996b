//! Compiler configuration, loaded from a JSON file.
//!
//! ```json
//! { "tokenizer": "sequential", "line_ending": "crlf" }
//! ```
//!
//! Every field is optional and falls back to its default.

use crate::lexer::TokenizerKind;
use crate::sql_compiler::LineEnding;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Tokenizer strategy used by [`crate::Compiler`].
    pub tokenizer: TokenizerKind,
    /// Line terminator of the generated SQL text.
    pub line_ending: LineEnding,
}

impl CompilerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, falling back to the default configuration when the file
    /// is missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_json_file(path).unwrap_or_else(|e| {
            warn!("{e}; using default compiler configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_json_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "tokenizer": "sequential", "line_ending": "crlf" }}"#).unwrap();

        let config = CompilerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.tokenizer, TokenizerKind::Sequential);
        assert_eq!(config.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = CompilerConfig::from_json_str(r#"{ "tokenizer": "sequential" }"#).unwrap();
        assert_eq!(config.tokenizer, TokenizerKind::Sequential);
        assert_eq!(config.line_ending, LineEnding::Lf);

        assert_eq!(CompilerConfig::from_json_str("{}").unwrap(), CompilerConfig::default());
    }

    #[test]
    fn test_invalid_json_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = CompilerConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        assert!(CompilerConfig::from_json_str(r#"{ "tokenizer": "fastest" }"#).is_err());
        assert!(CompilerConfig::from_json_str(r#"{ "tokenizr": "sequential" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiler.json");

        let result = CompilerConfig::from_json_file(&path);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        assert_eq!(CompilerConfig::load_or_default(&path), CompilerConfig::default());
    }
}
