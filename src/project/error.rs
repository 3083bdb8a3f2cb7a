use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::ParseError;

/// Why a file could not be (re)indexed.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The file did not parse. Any previously indexed model is kept.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl IndexError {
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
