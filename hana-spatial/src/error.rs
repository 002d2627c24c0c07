//! Error taxonomy of the spatial dialect.

use hana::errors::{ErrorKind, HanaError};
use thiserror::Error;

/// Errors raised while decoding geometries, resolving metadata or compiling
/// spatial filters.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// WKB bytes do not parse.
    #[error("Malformed wire format: {0}")]
    MalformedWireFormat(String),

    /// A predicate has no SQL mapping. Fatal to the whole compilation.
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// A catalog metadata query failed or returned nothing.
    #[error("Catalog probe failed: {0}")]
    CatalogProbeFailure(String),

    /// WKT or envelope text could not be parsed.
    #[error("Text parse failure: {0}")]
    TextParseFailure(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Core(#[from] HanaError),
}

impl From<SpatialError> for HanaError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::MalformedWireFormat(msg) => HanaError::new(
                &format!("Malformed wire format: {}", msg),
                ErrorKind::EncodingError,
            ),
            SpatialError::UnsupportedPredicate(msg) => HanaError::new(
                &format!("Unsupported predicate: {}", msg),
                ErrorKind::FilterError,
            ),
            SpatialError::CatalogProbeFailure(msg) => HanaError::new(
                &format!("Catalog probe failed: {}", msg),
                ErrorKind::CatalogError,
            ),
            SpatialError::TextParseFailure(msg) => HanaError::new(
                &format!("Text parse failure: {}", msg),
                ErrorKind::EncodingError,
            ),
            SpatialError::InvalidOperation(msg) => {
                HanaError::new(&msg, ErrorKind::ValidationError)
            }
            SpatialError::Core(err) => err,
        }
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;
