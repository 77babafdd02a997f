//! Kind-specific execution of update steps.

use crate::context::UpdateContext;
use crate::error::{Result, UpdateError};
use crate::services::{DatabaseService, MembershipAdapter};
use crate::splitter::ScriptSplitter;
use crate::step::{SqlAlternative, SqlSource, StepExecution, UpdateStep};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Executes exactly one kind-specific protocol per step.
///
/// The dispatcher does not evaluate preconditions or write completion
/// records; the [`Updater`](crate::Updater) does both around it.
pub struct StepDispatcher {
    splitter: Box<dyn ScriptSplitter>,
    membership: Option<Arc<dyn MembershipAdapter>>,
}

impl fmt::Debug for StepDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDispatcher")
            .field("membership", &self.membership.is_some())
            .finish()
    }
}

impl StepDispatcher {
    /// Creates a dispatcher splitting SQL with `splitter`.
    pub fn new(
        splitter: Box<dyn ScriptSplitter>,
        membership: Option<Arc<dyn MembershipAdapter>>,
    ) -> Self {
        Self {
            splitter,
            membership,
        }
    }

    /// Executes `step` against the context's database service.
    ///
    /// Returns [`StepExecution::Skipped`] when a SQL step has no alternative
    /// usable with the active database.
    pub fn dispatch(&self, ctx: &UpdateContext, step: &UpdateStep) -> Result<StepExecution> {
        match step {
            UpdateStep::Sql { alternatives } => self.execute_sql(ctx, alternatives),
            UpdateStep::AccountCreate {
                user_name,
                password,
                email,
                roles,
            } => self.create_account(ctx, user_name, password, email.as_deref(), roles),
            UpdateStep::AccountDelete { user_name } => self.delete_account(ctx, user_name),
            UpdateStep::RoleCreate { role_name } => {
                let adapter = self.membership(ctx)?;
                ctx.logger()
                    .trace_information(format_args!("Adding role '{}'", role_name));
                adapter.create_role(role_name)?;
                ctx.logger()
                    .trace_information(format_args!("Added role '{}'", role_name));
                Ok(StepExecution::Executed)
            }
            UpdateStep::RoleDelete { role_name } => {
                let adapter = self.membership(ctx)?;
                ctx.logger()
                    .trace_information(format_args!("Deleting role '{}'", role_name));
                adapter.delete_role(role_name)?;
                ctx.logger()
                    .trace_information(format_args!("Deleted role '{}'", role_name));
                Ok(StepExecution::Executed)
            }
            UpdateStep::Custom { handler, params } => {
                let custom = ctx.custom_step(handler)?;
                ctx.logger()
                    .trace_information(format_args!("Executing custom step '{}'", handler));
                custom.execute_update(ctx, params)?;
                Ok(StepExecution::Executed)
            }
        }
    }

    fn create_account(
        &self,
        ctx: &UpdateContext,
        user_name: &str,
        password: &str,
        email: Option<&str>,
        roles: &[String],
    ) -> Result<StepExecution> {
        let adapter = self.membership(ctx)?;
        let logger = ctx.logger();

        logger.trace_information(format_args!("Adding user '{}'", user_name));
        adapter.create_user(user_name, password, email)?;
        logger.trace_information(format_args!("Added user '{}'", user_name));

        if !roles.is_empty() {
            logger.trace_information(format_args!(
                "Adding user '{}' to roles {}",
                user_name,
                roles.join(",")
            ));
            adapter.add_user_to_roles(user_name, roles)?;
            logger.trace_information(format_args!("User '{}' added to roles", user_name));
        }

        Ok(StepExecution::Executed)
    }

    fn delete_account(&self, ctx: &UpdateContext, user_name: &str) -> Result<StepExecution> {
        let adapter = self.membership(ctx)?;
        let logger = ctx.logger();

        logger.trace_information(format_args!("Deleting user '{}'", user_name));
        if adapter.delete_user(user_name)? {
            logger.trace_information(format_args!("Deleted user '{}'", user_name));
        } else {
            logger.trace_warning(format_args!(
                "User '{}' was not deleted; it may not exist",
                user_name
            ));
        }

        Ok(StepExecution::Executed)
    }

    fn membership(&self, ctx: &UpdateContext) -> Result<&dyn MembershipAdapter> {
        let adapter = self.membership.as_deref().ok_or_else(|| {
            UpdateError::invalid_operation("no membership adapter configured for account steps")
        })?;
        ctx.logger()
            .trace_information(format_args!("Going to use membership adapter"));
        Ok(adapter)
    }

    fn execute_sql(
        &self,
        ctx: &UpdateContext,
        alternatives: &[SqlAlternative],
    ) -> Result<StepExecution> {
        let database = ctx.database()?;

        let Some(alternative) = select_alternative(database, alternatives) else {
            ctx.logger().trace_warning(format_args!(
                "No SQL alternative usable with database service '{}' found",
                database.name()
            ));
            return Ok(StepExecution::Skipped);
        };

        let script = match &alternative.source {
            SqlSource::Inline { sql } => Cow::Borrowed(sql.as_str()),
            SqlSource::Provider { provider, location } => Cow::Owned(ctx.script(provider, location)?),
        };

        for (index, statement) in self.splitter.split_script(&script)?.iter().enumerate() {
            let part = index + 1;
            ctx.logger()
                .trace_information(format_args!("Executing command part {}", part));
            database.execute_sql(statement)?;
            ctx.logger()
                .trace_information(format_args!("Finished command part {}", part));
        }

        Ok(StepExecution::Executed)
    }
}

/// Picks the SQL alternative to run on `database`.
///
/// The first alternative whose dialect the database reports as its own
/// wins; otherwise the last [`ALL_DIALECTS`](crate::ALL_DIALECTS) fallback;
/// otherwise `None`.
pub fn select_alternative<'a>(
    database: &dyn DatabaseService,
    alternatives: &'a [SqlAlternative],
) -> Option<&'a SqlAlternative> {
    alternatives
        .iter()
        .find(|a| !a.is_fallback() && database.is_db_type(&a.dialect))
        .or_else(|| alternatives.iter().rev().find(|a| a.is_fallback()))
}
