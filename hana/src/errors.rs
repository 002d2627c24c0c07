use backtrace::Backtrace;
use parking_lot::RwLock;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for dialect operations.
///
/// Each kind names a category of failure so that callers can react to it
/// without parsing messages.
///
/// # Examples
///
/// ```rust
/// use hana::errors::{HanaError, ErrorKind, HanaResult};
///
/// fn example() -> HanaResult<()> {
///     Err(HanaError::new("Column not found", ErrorKind::CatalogError))
/// }
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Error while compiling or evaluating a filter
    FilterError,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error encoding or decoding data
    EncodingError,
    /// Catalog metadata could not be read
    CatalogError,
    /// Generic IO error
    IOError,
    /// Generic validation error
    ValidationError,
    /// Invalid data type for operation
    InvalidDataType,
    /// Error from an extension crate (e.g. "spatial")
    Extension(String),
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::CatalogError => write!(f, "Catalog error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type shared by the dialect crates.
///
/// `HanaError` carries a message, a kind, an optional cause and the
/// backtrace captured at construction.
///
/// ```rust
/// use hana::errors::{HanaError, ErrorKind};
///
/// let cause = HanaError::new("connection reset", ErrorKind::IOError);
/// let err = HanaError::new_with_cause("SRID lookup failed", ErrorKind::CatalogError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct HanaError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<HanaError>>,
    backtrace: Arc<RwLock<Backtrace>>,
}

impl HanaError {
    /// Creates a new `HanaError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        HanaError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    /// Creates a new `HanaError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: HanaError) -> Self {
        HanaError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&HanaError> {
        self.cause.as_deref()
    }
}

impl Display for HanaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for HanaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for HanaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Result alias used by every fallible operation of the core crate.
pub type HanaResult<T> = Result<T, HanaError>;

impl From<std::io::Error> for HanaError {
    fn from(err: std::io::Error) -> Self {
        HanaError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::fmt::Error> for HanaError {
    fn from(err: std::fmt::Error) -> Self {
        HanaError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<std::num::ParseIntError> for HanaError {
    fn from(err: std::num::ParseIntError) -> Self {
        HanaError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<std::num::ParseFloatError> for HanaError {
    fn from(err: std::num::ParseFloatError) -> Self {
        HanaError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::InvalidDataType,
        )
    }
}

impl From<String> for HanaError {
    fn from(msg: String) -> Self {
        HanaError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for HanaError {
    fn from(msg: &str) -> Self {
        HanaError::new(msg, ErrorKind::InternalError)
    }
}
