use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for object-document mapping operations.
///
/// Each kind names one failure category so callers can match on it instead
/// of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::errors::{ErrorKind, OdmError, OdmResult};
///
/// fn example() -> OdmResult<()> {
///     Err(OdmError::new("Note can only be nested", ErrorKind::PersistError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Entity persistence
    /// An entity without a collection of its own was saved directly
    PersistError,
    /// An entity could not be retrieved (nested-only type or malformed query)
    RetrieveError,
    /// A lookup matched zero documents
    NotFound,

    // Mapping
    /// A stored mapping was loaded into an entity of another type
    TypeMismatch,
    /// A type tag has no registration in the configured namespace
    UnknownType,
    /// A required field (such as `_type`) is absent
    MissingField,
    /// Error mapping an object to or from a stored mapping
    ObjectMappingError,

    // Identity
    /// An identity cache key is not a valid identifier
    InvalidCacheKey,
    /// An identifier value is malformed
    InvalidId,

    // Store
    /// The collection name cannot be used
    InvalidCollectionName,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// A document with the same `_id` already exists
    DuplicateKey,
    /// The store or database has already been closed
    StoreClosed,
    /// Error reported by the storage backend
    BackendError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` for every retrieval failure, including [ErrorKind::NotFound].
    pub fn is_retrieve_error(&self) -> bool {
        matches!(self, ErrorKind::RetrieveError | ErrorKind::NotFound)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::PersistError => write!(f, "Persist error"),
            ErrorKind::RetrieveError => write!(f, "Retrieve error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::UnknownType => write!(f, "Unknown type"),
            ErrorKind::MissingField => write!(f, "Missing field"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidCacheKey => write!(f, "Invalid cache key"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidCollectionName => write!(f, "Invalid collection name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the object-document mapper.
///
/// `OdmError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use lisogo::errors::{ErrorKind, OdmError};
///
/// let cause = OdmError::new("store unavailable", ErrorKind::BackendError);
/// let err = OdmError::new_with_cause("Failed to save Note", ErrorKind::PersistError, cause);
/// ```
#[derive(Clone)]
pub struct OdmError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<OdmError>>,
    backtrace: Atomic<Backtrace>,
}

impl OdmError {
    /// Creates a new `OdmError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        OdmError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `OdmError` that wraps `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: OdmError) -> Self {
        OdmError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&OdmError> {
        self.cause.as_deref()
    }
}

impl Display for OdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for OdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for OdmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Result alias used by every fallible operation of the crate.
pub type OdmResult<T> = Result<T, OdmError>;

impl From<std::fmt::Error> for OdmError {
    fn from(err: std::fmt::Error) -> Self {
        OdmError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for OdmError {
    fn from(msg: String) -> Self {
        OdmError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for OdmError {
    fn from(msg: &str) -> Self {
        OdmError::new(msg, ErrorKind::InternalError)
    }
}
