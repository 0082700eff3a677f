// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationError;

/// クレート全体で使うエラー型
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// SWC のパースエラー。swc の診断型は Send ではないので文字列化して保持する
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("route table validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("no route matches {0}")]
    NoMatch(String),

    #[error("redirect loop while resolving {url}: {}", .chain.join(" -> "))]
    RedirectLoop { url: String, chain: Vec<String> },

    #[error("unknown route name: {0}")]
    UnknownRoute(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
