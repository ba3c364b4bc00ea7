//! Error type shared by every catalog backend.
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`NotFound`](CatalogError::NotFound) | a name lookup misses or the name is malformed for the catalog |
//! | [`Parse`](CatalogError::Parse) | a fixed-width or binary record cannot be decoded |
//! | [`File`](CatalogError::File) / [`Io`](CatalogError::Io) | a catalog file is missing, unreadable or not a regular file |
//! | [`Database`](CatalogError::Database) | an SQLite prepare/bind/step fails |
//! | [`Range`](CatalogError::Range) | a record index or iterator position is out of bounds |
//! | [`Logic`](CatalogError::Logic) | caller misuse, e.g. comparing iterators of different kinds |
//! | [`Config`](CatalogError::Config) | a configuration file cannot be parsed |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("cannot access {path:?}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("range error: {0}")]
    Range(String),

    #[error("logic error: {0}")]
    Logic(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn parse(what: impl Into<String>) -> Self {
        Self::Parse(what.into())
    }

    /// True for failures that only concern a single record.
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::NotFound(_) | Self::Range(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_error_names_the_path() {
        let err = CatalogError::file(
            "/no/such/catalog",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/no/such/catalog"), "unexpected: {}", msg);
        assert!(!err.is_record_error());
    }

    #[test]
    fn record_errors() {
        assert!(CatalogError::parse("bad magnitude").is_record_error());
        assert!(CatalogError::not_found("HIP1").is_record_error());
        assert!(!CatalogError::Logic("x".into()).is_record_error());
    }
}
