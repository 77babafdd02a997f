use crate::precondition::PreconditionDeclaration;
use crate::services::TracingLoggingService;
use serde::{Deserialize, Serialize};

/// Maps a connection string to the name of a registered database service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseServiceMapping {
    pub connection_string: String,
    pub database_service: String,
}

/// What the [`Updater`](crate::Updater) does after a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing step.
    #[default]
    Halt,
    /// Keep running later steps and report every failure.
    Continue,
}

/// Configuration of an update run.
///
/// Passed explicitly to
/// [`UpdateContextBuilder::new`](crate::UpdateContextBuilder::new).
///
/// # Examples
///
/// ```
/// use schemakeeper::{FailurePolicy, PreconditionDeclaration, UpdateConfig};
///
/// let config = UpdateConfig::default()
///     .with_mapping("Data Source=app.db", "sqlite")
///     .with_default_precondition(PreconditionDeclaration::new("StepNotExecuted"))
///     .with_failure_policy(FailurePolicy::Continue);
///
/// assert_eq!(config.database_service_for("Data Source=app.db"), Some("sqlite"));
/// assert_eq!(config.database_service_for("Data Source=other.db"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Logging service used when none is initialized explicitly.
    /// Default: `"tracing"`.
    pub logging_service: Option<String>,
    /// Connection string to database service mappings, searched in order.
    pub database_mappings: Vec<DatabaseServiceMapping>,
    /// Preconditions evaluated before every step's own preconditions.
    pub default_preconditions: Vec<PreconditionDeclaration>,
    pub failure_policy: FailurePolicy,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            logging_service: Some(TracingLoggingService::NAME.to_string()),
            database_mappings: Vec::new(),
            default_preconditions: Vec::new(),
            failure_policy: FailurePolicy::Halt,
        }
    }
}

impl UpdateConfig {
    /// Sets the default logging service name.
    pub fn with_logging_service(mut self, name: impl Into<String>) -> Self {
        self.logging_service = Some(name.into());
        self
    }

    /// Adds a connection string mapping.
    pub fn with_mapping(
        mut self,
        connection_string: impl Into<String>,
        database_service: impl Into<String>,
    ) -> Self {
        self.database_mappings.push(DatabaseServiceMapping {
            connection_string: connection_string.into(),
            database_service: database_service.into(),
        });
        self
    }

    /// Adds a process-wide default precondition.
    pub fn with_default_precondition(mut self, precondition: PreconditionDeclaration) -> Self {
        self.default_preconditions.push(precondition);
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Returns the database service mapped to `connection_string`.
    ///
    /// The first mapping whose connection string is equal wins.
    pub fn database_service_for(&self, connection_string: &str) -> Option<&str> {
        self.database_mappings
            .iter()
            .find(|m| m.connection_string == connection_string)
            .map(|m| m.database_service.as_str())
    }
}
