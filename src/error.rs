//! Error taxonomy shared by config loading, rendering and output.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed or missing render inputs (task without title or number, bad sizes).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to parse {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),

    #[error("tokenizer failed: {0}")]
    Tokenize(String),

    #[error("font family not loaded: {0}")]
    FontUnavailable(String),

    #[error("paint failed: {0}")]
    Paint(String),

    #[error("png encode failed: {0}")]
    Encode(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config watch failed: {0}")]
    Watch(#[from] notify::Error),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_input() {
        let err = RenderError::ResourceNotFound(PathBuf::from("/tmp/missing.png"));
        assert_eq!(err.to_string(), "resource not found: /tmp/missing.png");
        let err = RenderError::UnsupportedLanguage("brainfuck".into());
        assert_eq!(err.to_string(), "unsupported language: \"brainfuck\"");
    }
}
