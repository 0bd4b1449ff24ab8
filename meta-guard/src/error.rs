//! Error types for the meta-guard metadata library.
//!
//! All fallible operations return [`MetaError`] through the crate-wide
//! [`Result`] alias. Failures are scoped to a single construction call or a
//! single candidate; none of them is process-fatal.
//!
//! Missing column statistics are not an error: the statistics provider
//! answers `None` and classifiers report an unknown verdict instead.

use thiserror::Error;

/// The main error type for the meta-guard library.
#[derive(Error, Debug)]
pub enum MetaError {
    /// Malformed input to a constructor: a PIND with mismatched or unsorted
    /// column ids, out-of-range thresholds or weights, a non-unary candidate.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A catalog name lookup found nothing.
    #[error("No {kind} found with the name '{name}'")]
    NotFound {
        /// What was looked up ("schema", "table", "column")
        kind: &'static str,
        /// The name that was looked up
        name: String,
    },

    /// A catalog name lookup found more than one match.
    #[error("{matches} {kind}s found with the name '{name}'")]
    AmbiguousName {
        /// What was looked up ("schema", "table", "column")
        kind: &'static str,
        /// The name that was looked up
        name: String,
        /// Number of matching catalog objects
        matches: usize,
    },

    /// The catalog id space for schemas, tables or columns is exhausted.
    #[error("Cannot allocate another {kind}: limit of {limit} reached")]
    CapacityExceeded {
        /// What could not be allocated
        kind: &'static str,
        /// Maximum number of objects of that kind
        limit: u32,
    },

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error when parsing DDL or other textual input.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when an operation is not supported.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, MetaError>`.
///
/// # Examples
///
/// ```rust
/// use meta_guard::error::{MetaError, Result};
///
/// fn check_ratio(ratio: f64) -> Result<f64> {
///     if ratio < 0.0 {
///         return Err(MetaError::invalid_argument("ratio must not be negative"));
///     }
///     Ok(ratio)
/// }
///
/// assert!(check_ratio(-1.0).is_err());
/// ```
pub type Result<T> = std::result::Result<T, MetaError>;

impl MetaError {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a new not-found error for a catalog lookup.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a new ambiguous-name error for a catalog lookup.
    pub fn ambiguous(kind: &'static str, name: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousName {
            kind,
            name: name.into(),
            matches,
        }
    }

    /// Returns true for errors caused by malformed input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, MetaError::InvalidArgument(_))
    }

    /// Returns true for catalog lookups that matched more than one object.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MetaError::AmbiguousName { .. })
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<MetaError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

fn wrap(msg: &str, error: MetaError) -> MetaError {
    match error {
        // Keep the variant for errors callers branch on.
        MetaError::InvalidArgument(inner) => MetaError::InvalidArgument(format!("{msg}: {inner}")),
        MetaError::Configuration(inner) => MetaError::Configuration(format!("{msg}: {inner}")),
        MetaError::Parse(inner) => MetaError::Parse(format!("{msg}: {inner}")),
        MetaError::Internal(inner) => MetaError::Internal(format!("{msg}: {inner}")),
        other => MetaError::Internal(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = MetaError::invalid_argument("dependent ids must be sorted");
        assert_eq!(
            err.to_string(),
            "Invalid argument: dependent ids must be sorted"
        );
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_lookup_errors_are_distinct() {
        let missing = MetaError::not_found("column", "customer_id");
        assert_eq!(
            missing.to_string(),
            "No column found with the name 'customer_id'"
        );
        assert!(!missing.is_ambiguous());

        let ambiguous = MetaError::ambiguous("column", "id", 3);
        assert_eq!(ambiguous.to_string(), "3 columns found with the name 'id'");
        assert!(ambiguous.is_ambiguous());
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = MetaError::CapacityExceeded {
            kind: "table",
            limit: 4095,
        };
        assert_eq!(
            err.to_string(),
            "Cannot allocate another table: limit of 4095 reached"
        );
    }

    #[test]
    fn test_serde_error_conversion() {
        let parsed: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: MetaError = parsed.unwrap_err().into();
        assert!(matches!(err, MetaError::Serialization(_)));
    }

    #[test]
    fn test_error_context_keeps_invalid_argument() {
        fn failing_operation() -> Result<()> {
            Err(MetaError::invalid_argument("arity mismatch"))
        }

        let err = failing_operation()
            .context("While loading inclusion dependencies")
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err
            .to_string()
            .contains("While loading inclusion dependencies: arity mismatch"));
    }

    #[test]
    fn test_error_context_wraps_io() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.sql",
        ));
        let err = io.with_context(|| "Reading DDL".to_string()).unwrap_err();
        assert!(matches!(err, MetaError::Internal(_)));
        assert!(err.to_string().contains("Reading DDL"));
    }
}
