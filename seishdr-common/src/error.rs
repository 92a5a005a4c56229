//! Error severity classification for seishdr
//!
//! Every crate in the workspace defines its own `thiserror` enum. To let
//! callers pick a log level or decide whether to abort initialization, each
//! of those enums implements [`Severity`].

/// Severity levels for error classification
///
/// # Severity Levels
///
/// - **Warning**: Something looks wrong but the operation completed. A
///   resolution batch with a schema mismatch on one field is a warning.
/// - **Error**: The operation failed, other operations are unaffected.
///   A configuration file that fails to parse is an error.
/// - **Critical**: Initialization cannot continue. A malformed header schema
///   is critical because no record can be resolved against it.
///
/// # Examples
///
/// ```rust
/// use seishdr_common::ErrorSeverity;
///
/// let malformed_schema = ErrorSeverity::Critical;
/// let bad_config_file = ErrorSeverity::Error;
/// assert_ne!(malformed_schema, bad_config_file);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Potential issue but operation can proceed
    Warning,

    /// Operation failed but the caller can continue
    Error,

    /// Initialization cannot continue
    Critical,
}

impl ErrorSeverity {
    /// The `tracing` level matching this severity.
    pub fn level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Error | ErrorSeverity::Critical => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Trait for error types that have severity levels
///
/// # Example
///
/// ```rust
/// use seishdr_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum LoadError {
///     DuplicateField,
///     MissingFile,
/// }
///
/// impl Severity for LoadError {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             LoadError::DuplicateField => ErrorSeverity::Critical,
///             LoadError::MissingFile => ErrorSeverity::Error,
///         }
///     }
/// }
///
/// assert_eq!(LoadError::DuplicateField.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error must halt initialization.
    fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}
