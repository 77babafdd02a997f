use crate::identity::StepIdentity;
use thiserror::Error;

/// The registry namespace an entry belongs to.
///
/// Used in [`UpdateError::DuplicateName`] and [`UpdateError::NotFound`] to
/// identify which registry rejected the operation. Names may legitimately
/// collide across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// A [`LoggingService`](crate::LoggingService).
    Logging,
    /// A [`DatabaseService`](crate::DatabaseService) prototype.
    Database,
    /// A [`ScriptProviderService`](crate::ScriptProviderService).
    ScriptProvider,
    /// A [`Precondition`](crate::Precondition).
    Precondition,
    /// A [`CustomStep`](crate::CustomStep) handler.
    CustomStep,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Logging => write!(f, "logging service"),
            ServiceKind::Database => write!(f, "database service"),
            ServiceKind::ScriptProvider => write!(f, "script provider"),
            ServiceKind::Precondition => write!(f, "precondition"),
            ServiceKind::CustomStep => write!(f, "custom step"),
        }
    }
}

/// Flat error category, independent of the variant payload.
///
/// Returned by [`UpdateError::kind`], which looks through
/// [`UpdateError::StepFailed`] so callers can match on the root cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidConfiguration,
    InvalidOperation,
    DuplicateName,
    NotFound,
    MappingNotFound,
    NotRegistered,
    SqlExecution,
    TypeNotFound,
    Membership,
    ScriptProvider,
}

/// Errors that can occur while configuring or running an update.
///
/// Every failure surfaced by this crate is an `UpdateError`, so callers have
/// a single type to handle. Recoverable outcomes such as a failed
/// precondition or a step without a usable SQL alternative are not errors;
/// they are reported as [`StepState`](crate::StepState)s.
///
/// # Non-Exhaustive
///
/// New variants may be added. Match with a wildcard, or match on
/// [`UpdateError::kind`]:
///
/// ```
/// use schemakeeper::{ErrorKind, UpdateError};
///
/// fn is_configuration_problem(error: &UpdateError) -> bool {
///     matches!(
///         error.kind(),
///         ErrorKind::DuplicateName
///             | ErrorKind::MappingNotFound
///             | ErrorKind::NotRegistered
///             | ErrorKind::InvalidConfiguration
///     )
/// }
///
/// let error = UpdateError::MappingNotFound("Data Source=app.db".to_string());
/// assert!(is_configuration_problem(&error));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpdateError {
    /// Missing or malformed parameters passed to a predicate or registry call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A service or declaration is misconfigured (for example an empty name).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operation is not valid in the current state of the context.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A name was registered twice in the same namespace.
    #[error("The {kind} '{name}' is already registered")]
    DuplicateName {
        /// Registry that rejected the registration
        kind: ServiceKind,
        /// The duplicated name
        name: String,
    },

    /// A lookup referenced a name that was never registered.
    #[error("The {kind} '{name}' is not registered")]
    NotFound {
        /// Registry that was searched
        kind: ServiceKind,
        /// The missing name
        name: String,
    },

    /// No database service mapping matches the connection string.
    #[error("No database service mapping found for connection string '{0}'")]
    MappingNotFound(String),

    /// The mapping names a database service that has no registered prototype.
    #[error("Database service '{0}' is mapped but not registered")]
    NotRegistered(String),

    /// The database rejected a statement.
    #[error("SQL execution failed: {details}")]
    SqlExecution {
        /// The statement that failed
        statement: String,
        /// Backend-specific failure details
        details: String,
    },

    /// A custom step referenced a handler that is not registered.
    #[error("Custom step handler '{0}' not found")]
    TypeNotFound(String),

    /// The account-provisioning adapter failed.
    #[error("Membership adapter failed: {0}")]
    Membership(String),

    /// A script provider could not produce the requested script.
    #[error("Script provider '{provider}' failed for '{location}': {details}")]
    ScriptProvider {
        /// Name of the provider
        provider: String,
        /// Requested location
        location: String,
        /// Failure details
        details: String,
    },

    /// A step failed; `source` is the underlying cause.
    #[error("Step {identity} failed: {source}")]
    StepFailed {
        /// Identity of the failing step
        identity: StepIdentity,
        /// The underlying error
        #[source]
        source: Box<UpdateError>,
    },
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

impl UpdateError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a SQL execution error for `statement`
    pub fn sql(statement: impl Into<String>, details: impl Into<String>) -> Self {
        Self::SqlExecution {
            statement: statement.into(),
            details: details.into(),
        }
    }

    /// Create a membership adapter error
    pub fn membership(msg: impl Into<String>) -> Self {
        Self::Membership(msg.into())
    }

    /// Returns the category of this error.
    ///
    /// For [`UpdateError::StepFailed`] the category of the wrapped cause is
    /// returned.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            UpdateError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            UpdateError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            UpdateError::DuplicateName { .. } => ErrorKind::DuplicateName,
            UpdateError::NotFound { .. } => ErrorKind::NotFound,
            UpdateError::MappingNotFound(_) => ErrorKind::MappingNotFound,
            UpdateError::NotRegistered(_) => ErrorKind::NotRegistered,
            UpdateError::SqlExecution { .. } => ErrorKind::SqlExecution,
            UpdateError::TypeNotFound(_) => ErrorKind::TypeNotFound,
            UpdateError::Membership(_) => ErrorKind::Membership,
            UpdateError::ScriptProvider { .. } => ErrorKind::ScriptProvider,
            UpdateError::StepFailed { source, .. } => source.kind(),
        }
    }

    /// Returns the identity of the failing step, if this error is tied to one.
    pub fn step(&self) -> Option<&StepIdentity> {
        match self {
            UpdateError::StepFailed { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub(crate) fn step_failed(identity: StepIdentity, source: UpdateError) -> Self {
        Self::StepFailed {
            identity,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = UpdateError::DuplicateName {
            kind: ServiceKind::Precondition,
            name: "StepNotExecuted".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "The precondition 'StepNotExecuted' is already registered"
        );

        let error = UpdateError::sql("DROP TABLE t", "no such table: t");
        assert_eq!(error.to_string(), "SQL execution failed: no such table: t");
    }

    #[test]
    fn test_step_failed_display_and_kind() {
        let error = UpdateError::step_failed(
            StepIdentity::new("app", "1.0", 3),
            UpdateError::TypeNotFound("SeedData".to_string()),
        );
        assert_eq!(
            error.to_string(),
            "Step app/1.0/3 failed: Custom step handler 'SeedData' not found"
        );
        assert_eq!(error.kind(), ErrorKind::TypeNotFound);
        assert_eq!(error.step(), Some(&StepIdentity::new("app", "1.0", 3)));
    }

    #[test]
    fn test_service_kind_display() {
        assert_eq!(ServiceKind::Logging.to_string(), "logging service");
        assert_eq!(ServiceKind::Database.to_string(), "database service");
        assert_eq!(ServiceKind::ScriptProvider.to_string(), "script provider");
        assert_eq!(ServiceKind::CustomStep.to_string(), "custom step");
    }
}
