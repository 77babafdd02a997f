use crate::error::{Result, UpdateError};
use crate::identity::StepIdentity;
use crate::registry::Named;
use crate::step::StepExecution;

/// Backend adapter for one SQL dialect.
///
/// Instances registered on the
/// [`UpdateContextBuilder`](crate::UpdateContextBuilder) are prototypes:
/// the context asks the mapped prototype for a clone bound to the target
/// connection string, and that clone is owned exclusively by the context
/// until it is disposed.
///
/// The completion records written by [`mark_step_executed`] are owned by the
/// implementation; the core only queries them through
/// [`is_step_executed`].
///
/// [`mark_step_executed`]: DatabaseService::mark_step_executed
/// [`is_step_executed`]: DatabaseService::is_step_executed
pub trait DatabaseService: Send {
    /// Registration name, referenced by connection-string mappings.
    fn name(&self) -> &str;

    /// Returns `true` if this service handles the dialect `tag`.
    fn is_db_type(&self, tag: &str) -> bool;

    /// Executes a single statement.
    ///
    /// Fails with [`UpdateError::SqlExecution`] when the backend rejects it.
    fn execute_sql(&self, statement: &str) -> Result<()>;

    /// Returns `true` if the index or key `name` exists on `owner_table`.
    fn object_exists(&self, name: &str, owner_table: &str) -> Result<bool>;

    /// Returns `true` if the table exists.
    fn table_exists(&self, table: &str) -> Result<bool> {
        Err(UpdateError::invalid_operation(format!(
            "database service '{}' cannot check table '{}'",
            DatabaseService::name(self),
            table
        )))
    }

    /// Returns `true` if the view exists.
    fn view_exists(&self, view: &str) -> Result<bool> {
        Err(UpdateError::invalid_operation(format!(
            "database service '{}' cannot check view '{}'",
            DatabaseService::name(self),
            view
        )))
    }

    /// Returns `true` if a completion record exists for `step`.
    fn is_step_executed(&self, step: &StepIdentity) -> Result<bool>;

    /// Writes the completion record for `step`.
    fn mark_step_executed(&self, step: &StepIdentity) -> Result<()>;

    /// Runs a step body and records its completion.
    ///
    /// `body` performs the step's work. When it returns
    /// [`StepExecution::Executed`] and `record` is set, the completion
    /// record is written. The default runs both sequentially; backends with
    /// transactional DDL should override this to commit the body's effects
    /// and the record atomically.
    fn execute_step(
        &self,
        step: &StepIdentity,
        record: bool,
        body: &mut dyn FnMut() -> Result<StepExecution>,
    ) -> Result<StepExecution> {
        let execution = body()?;
        if record && execution == StepExecution::Executed {
            self.mark_step_executed(step)?;
        }
        Ok(execution)
    }

    /// Produces an instance configured for `connection_string`.
    fn clone_for_connection_string(
        &self,
        connection_string: &str,
    ) -> Result<Box<dyn DatabaseService>>;

    /// Releases connections held by this instance.
    ///
    /// Called at most once by the owning context.
    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Named for dyn DatabaseService {
    fn name(&self) -> &str {
        DatabaseService::name(self)
    }
}
