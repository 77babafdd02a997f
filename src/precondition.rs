//! Named predicates gating step execution.

use crate::context::UpdateContext;
use crate::error::{Result, UpdateError};
use crate::registry::Named;
use serde::{Deserialize, Serialize};

/// Reference to a registered [`Precondition`] with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionDeclaration {
    /// Registered precondition name
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    /// Label used in diagnostics
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl PreconditionDeclaration {
    /// Creates a declaration without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            friendly_name: None,
        }
    }

    /// Creates a declaration with parameters.
    pub fn with_params<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            friendly_name: None,
        }
    }

    /// Sets the diagnostic label.
    pub fn named(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    /// Returns the friendly name, falling back to the precondition name.
    pub fn label(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.name)
    }
}

/// A named boolean predicate evaluated before a step runs.
///
/// Implementations validate their own parameters and fail with
/// [`UpdateError::InvalidArgument`] when they are not satisfied.
///
/// # Examples
///
/// ```
/// use schemakeeper::{Precondition, Result, UpdateContext};
///
/// #[derive(Debug)]
/// struct NeverOnProduction;
///
/// impl Precondition for NeverOnProduction {
///     fn name(&self) -> &str {
///         "NeverOnProduction"
///     }
///
///     fn check(&self, ctx: &UpdateContext, _params: &[String]) -> Result<bool> {
///         Ok(!ctx.database()?.is_db_type("production"))
///     }
/// }
/// ```
pub trait Precondition: Send + Sync {
    /// Reference name used in [`PreconditionDeclaration::name`].
    fn name(&self) -> &str;

    /// Evaluates the predicate for the context's current step.
    fn check(&self, ctx: &UpdateContext, params: &[String]) -> Result<bool>;
}

impl Named for dyn Precondition {
    fn name(&self) -> &str {
        Precondition::name(self)
    }
}

/// True iff the current step has no completion record.
///
/// Reference name `StepNotExecuted`, no parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepNotExecuted;

impl StepNotExecuted {
    pub const NAME: &'static str = "StepNotExecuted";
}

impl Precondition for StepNotExecuted {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, ctx: &UpdateContext, _params: &[String]) -> Result<bool> {
        let identity = ctx.current_step().ok_or_else(|| {
            UpdateError::invalid_operation(format!(
                "{} evaluated outside of a step",
                Self::NAME
            ))
        })?;

        Ok(!ctx.database()?.is_step_executed(identity)?)
    }
}

/// True iff the named object of the owning table does not exist.
///
/// Reference name `ObjectNotFound`. Parameters: object name (index, primary
/// or foreign key) and owning table, both non-empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectNotFound;

impl ObjectNotFound {
    pub const NAME: &'static str = "ObjectNotFound";
}

impl Precondition for ObjectNotFound {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, ctx: &UpdateContext, params: &[String]) -> Result<bool> {
        let [object, table] = required_params::<2>(Self::NAME, params, "object name and table")?;
        Ok(!ctx.database()?.object_exists(object, table)?)
    }
}

/// True iff the table does not exist. Reference name `TableNotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableNotFound;

impl TableNotFound {
    pub const NAME: &'static str = "TableNotFound";
}

impl Precondition for TableNotFound {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, ctx: &UpdateContext, params: &[String]) -> Result<bool> {
        let [table] = required_params::<1>(Self::NAME, params, "table name")?;
        Ok(!ctx.database()?.table_exists(table)?)
    }
}

/// True iff the view does not exist. Reference name `ViewNotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewNotFound;

impl ViewNotFound {
    pub const NAME: &'static str = "ViewNotFound";
}

impl Precondition for ViewNotFound {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check(&self, ctx: &UpdateContext, params: &[String]) -> Result<bool> {
        let [view] = required_params::<1>(Self::NAME, params, "view name")?;
        Ok(!ctx.database()?.view_exists(view)?)
    }
}

/// Returns the first `N` parameters, each required to be non-empty.
fn required_params<'a, const N: usize>(
    precondition: &str,
    params: &'a [String],
    what: &str,
) -> Result<[&'a str; N]> {
    let invalid = || {
        UpdateError::invalid_argument(format!(
            "{} for precondition {} must be specified",
            what, precondition
        ))
    };

    if params.len() < N {
        return Err(invalid());
    }

    let mut values = [""; N];
    for (value, param) in values.iter_mut().zip(params) {
        if param.is_empty() {
            return Err(invalid());
        }
        *value = param.as_str();
    }
    Ok(values)
}
