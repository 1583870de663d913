use thiserror::Error;

use crate::catalog::mpc_comet_reader::ParseCometError;

#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("Invalid catalog source: {0}")]
    InvalidCatalogSource(String),

    #[error("Error while parsing line {line} of the comet catalog: {source}")]
    CatalogParse {
        line: usize,
        #[source]
        source: ParseCometError,
    },

    #[error("The comet catalog does not contain any record")]
    EmptyCatalog,

    #[error("Catalog file not found at: {0}")]
    CatalogFileNotFound(String),

    #[error("HTTP ureq error: {0}")]
    UreqHttpError(#[from] ureq::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cache dir creation error for the comet catalog: {0}")]
    UnableToCreateCacheDir(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Orbit propagation failed: {0}")]
    PropagationFailed(String),

    #[error("ROOTS finding error: {0}")]
    RootFindingError(#[from] roots::SearchError),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid observer location: {0}")]
    InvalidObserver(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("Unable to read {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed calendar: {0}")]
    MalformedCalendar(String),
}

impl PartialEq for AlmanacError {
    fn eq(&self, other: &Self) -> bool {
        use AlmanacError::*;
        match (self, other) {
            (InvalidCatalogSource(a), InvalidCatalogSource(b)) => a == b,
            (
                CatalogParse {
                    line: la,
                    source: sa,
                },
                CatalogParse {
                    line: lb,
                    source: sb,
                },
            ) => la == lb && sa == sb,
            (CatalogFileNotFound(a), CatalogFileNotFound(b)) => a == b,

            // io and http errors carry no comparable payload: same variant is enough
            (UreqHttpError(_), UreqHttpError(_)) => true,
            (IoError(_), IoError(_)) => true,
            (FileAccess { path: a, .. }, FileAccess { path: b, .. }) => a == b,

            (UnableToCreateCacheDir(a), UnableToCreateCacheDir(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,
            (PropagationFailed(a), PropagationFailed(b)) => a == b,
            (RootFindingError(a), RootFindingError(b)) => a == b,
            (InvalidTime(a), InvalidTime(b)) => a == b,
            (InvalidObserver(a), InvalidObserver(b)) => a == b,
            (UnknownTimeZone(a), UnknownTimeZone(b)) => a == b,
            (MalformedCalendar(a), MalformedCalendar(b)) => a == b,

            (EmptyCatalog, EmptyCatalog) => true,

            _ => false,
        }
    }
}
