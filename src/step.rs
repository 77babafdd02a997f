use crate::precondition::PreconditionDeclaration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dialect tag of a SQL alternative usable with any database service.
pub const ALL_DIALECTS: &str = "all";

/// Where the SQL text of an alternative comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlSource {
    /// SQL embedded in the declaration.
    Inline {
        /// Script text, possibly holding several statements
        sql: String,
    },
    /// SQL loaded through a registered [`ScriptProviderService`](crate::ScriptProviderService).
    Provider {
        /// Name of the script provider
        provider: String,
        /// Provider-specific location of the script
        location: String,
    },
}

/// One dialect-tagged SQL script of a [`UpdateStep::Sql`] step.
///
/// # Examples
///
/// ```
/// use schemakeeper::SqlAlternative;
///
/// let mysql = SqlAlternative::inline("mysql", "CREATE TABLE t (id INT) ENGINE=InnoDB;");
/// let fallback = SqlAlternative::inline("all", "CREATE TABLE t (id INT);");
/// assert!(!mysql.is_fallback());
/// assert!(fallback.is_fallback());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlAlternative {
    /// Dialect tag, or [`ALL_DIALECTS`] for a fallback
    pub dialect: String,
    #[serde(flatten)]
    pub source: SqlSource,
}

impl SqlAlternative {
    /// Creates an alternative with inline SQL.
    pub fn inline(dialect: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            source: SqlSource::Inline { sql: sql.into() },
        }
    }

    /// Creates an alternative whose script is fetched from a script provider.
    pub fn from_provider(
        dialect: impl Into<String>,
        provider: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            dialect: dialect.into(),
            source: SqlSource::Provider {
                provider: provider.into(),
                location: location.into(),
            },
        }
    }

    /// Returns `true` if this alternative is tagged [`ALL_DIALECTS`].
    pub fn is_fallback(&self) -> bool {
        self.dialect == ALL_DIALECTS
    }
}

/// The work performed by one update step.
///
/// Each variant is handled by exactly one arm of the
/// [`StepDispatcher`](crate::StepDispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateStep {
    /// Raw SQL with per-dialect alternatives.
    Sql {
        /// Alternatives in declaration order
        alternatives: Vec<SqlAlternative>,
    },
    /// Create an account and optionally assign it to roles.
    AccountCreate {
        user_name: String,
        password: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        roles: Vec<String>,
    },
    /// Delete an account. A missing account is not an error.
    AccountDelete { user_name: String },
    /// Create a role.
    RoleCreate { role_name: String },
    /// Delete a role.
    RoleDelete { role_name: String },
    /// Run a registered [`CustomStep`](crate::CustomStep) handler.
    Custom {
        /// Registered handler name
        handler: String,
        /// Opaque parameters passed to the handler
        #[serde(default)]
        params: Vec<String>,
    },
}

impl UpdateStep {
    /// Creates a SQL step from its alternatives.
    pub fn sql(alternatives: impl IntoIterator<Item = SqlAlternative>) -> Self {
        UpdateStep::Sql {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    /// Creates a custom step invoking `handler`.
    pub fn custom<I, S>(handler: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UpdateStep::Custom {
            handler: handler.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name of the step kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            UpdateStep::Sql { .. } => "sql",
            UpdateStep::AccountCreate { .. } => "account_create",
            UpdateStep::AccountDelete { .. } => "account_delete",
            UpdateStep::RoleCreate { .. } => "role_create",
            UpdateStep::RoleDelete { .. } => "role_delete",
            UpdateStep::Custom { .. } => "custom",
        }
    }
}

fn default_mark_as_executed() -> bool {
    true
}

/// A step as declared inside a version of an [`UpdateManifest`](crate::UpdateManifest).
///
/// # Examples
///
/// ```
/// use schemakeeper::{DeclaredStep, PreconditionDeclaration, SqlAlternative, UpdateStep};
///
/// let step = DeclaredStep::new(1, UpdateStep::sql([SqlAlternative::inline("all", "SELECT 1;")]))
///     .named("Smoke test")
///     .with_precondition(PreconditionDeclaration::new("StepNotExecuted"));
///
/// assert_eq!(step.label(), "Smoke test");
/// assert!(step.mark_as_executed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredStep {
    /// Ordinal number of the step inside its version
    pub id: u32,
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Whether a completion record is written after the step succeeds
    #[serde(default = "default_mark_as_executed")]
    pub mark_as_executed: bool,
    #[serde(default)]
    pub preconditions: Vec<PreconditionDeclaration>,
    #[serde(flatten)]
    pub kind: UpdateStep,
}

impl DeclaredStep {
    /// Creates a recorded step without preconditions.
    pub fn new(id: u32, kind: UpdateStep) -> Self {
        Self {
            id,
            friendly_name: None,
            mark_as_executed: true,
            preconditions: Vec::new(),
            kind,
        }
    }

    /// Sets the friendly name used in diagnostics.
    pub fn named(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    /// Appends a precondition.
    pub fn with_precondition(mut self, precondition: PreconditionDeclaration) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Runs the step without writing a completion record.
    pub fn not_recorded(mut self) -> Self {
        self.mark_as_executed = false;
        self
    }

    /// Returns the friendly name, or the step kind when none was given.
    pub fn label(&self) -> &str {
        self.friendly_name
            .as_deref()
            .unwrap_or_else(|| self.kind.kind_name())
    }
}

/// What the dispatcher did with a step body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepExecution {
    /// The body ran to completion.
    Executed,
    /// Nothing usable for the active database; the body did not run.
    Skipped,
}

/// Terminal state of one step.
///
/// A [`StepState::Failed`] step is also reported as an
/// [`UpdateError`](crate::UpdateError) in the run's failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    /// No SQL alternative matched the active database.
    Skipped,
    /// A precondition evaluated to `false`; the step did not run.
    PreconditionFailed {
        /// Label of the first failing precondition
        precondition: String,
    },
    /// The step ran. `recorded` tells whether a completion record was written.
    Completed { recorded: bool },
    /// The step failed and left no completion record.
    Failed {
        /// Display text of the underlying error
        reason: String,
    },
}

impl StepState {
    /// Returns `true` if the step body ran.
    pub fn is_completed(&self) -> bool {
        matches!(self, StepState::Completed { .. })
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Skipped => write!(f, "skipped"),
            StepState::PreconditionFailed { precondition } => {
                write!(f, "precondition '{}' failed", precondition)
            }
            StepState::Completed { recorded: true } => write!(f, "completed"),
            StepState::Completed { recorded: false } => write!(f, "completed (not recorded)"),
            StepState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
