//! Sequential execution of an update manifest.

use crate::config::FailurePolicy;
use crate::context::UpdateContext;
use crate::dispatch::StepDispatcher;
use crate::error::{Result, UpdateError};
use crate::identity::StepIdentity;
use crate::manifest::UpdateManifest;
use crate::services::MembershipAdapter;
use crate::splitter::{ScriptSplitter, SqlScriptSplitter};
use crate::step::{DeclaredStep, StepExecution, StepState};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of one step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub identity: StepIdentity,
    pub friendly_name: Option<String>,
    pub state: StepState,
}

/// Outcomes of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    steps: Vec<StepReport>,
}

impl RunReport {
    /// Returns every step outcome.
    pub fn steps(&self) -> &[StepReport] {
        &self.steps
    }

    /// Returns the state of `identity`, if it was processed.
    pub fn state_of(&self, identity: &StepIdentity) -> Option<&StepState> {
        self.steps
            .iter()
            .find(|s| &s.identity == identity)
            .map(|s| &s.state)
    }

    /// Number of steps whose body ran.
    pub fn completed(&self) -> usize {
        self.count(|s| s.is_completed())
    }

    /// Number of steps without a usable SQL alternative.
    pub fn skipped(&self) -> usize {
        self.count(|s| *s == StepState::Skipped)
    }

    /// Number of steps stopped by a precondition.
    pub fn precondition_failed(&self) -> usize {
        self.count(|s| matches!(s, StepState::PreconditionFailed { .. }))
    }

    /// Number of steps that failed.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, StepState::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&StepState) -> bool) -> usize {
        self.steps.iter().filter(|s| predicate(&s.state)).count()
    }
}

/// A run with at least one failed step.
///
/// `report` holds the state of every step processed before the run ended,
/// failed ones included; `errors` holds the matching
/// [`UpdateError::StepFailed`] errors in execution order. A manifest that
/// fails validation yields an empty report and the validation error.
#[derive(Error, Debug)]
#[error("update run failed with {} error(s)", .errors.len())]
pub struct RunFailure {
    pub report: RunReport,
    pub errors: Vec<UpdateError>,
}

/// Runs update manifests against a bound [`UpdateContext`].
///
/// Steps run strictly in declaration order, one at a time. For each step the
/// updater sets the context's current step, evaluates the default and step
/// preconditions, and dispatches the step inside the database service's
/// [`execute_step`](crate::DatabaseService::execute_step) scope, which writes
/// the completion record.
///
/// # Examples
///
/// ```rust,ignore
/// use schemakeeper::prelude::*;
///
/// let mut builder = UpdateContextBuilder::with_builtins(
///     UpdateConfig::default()
///         .with_mapping("Data Source=app.db", "sqlite")
///         .with_default_precondition(PreconditionDeclaration::new("StepNotExecuted")),
/// )?;
/// builder.register_database_service(SqliteDatabaseService::default())?;
/// let mut ctx = builder.initialize_database_service("Data Source=app.db")?;
///
/// match Updater::new().execute(&mut ctx, &manifest) {
///     Ok(report) => println!("{} steps completed", report.completed()),
///     Err(failure) => println!(
///         "{} steps completed before {}",
///         failure.report.completed(),
///         failure
///     ),
/// }
/// ```
pub struct Updater {
    dispatcher: StepDispatcher,
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Default for Updater {
    fn default() -> Self {
        Self::new()
    }
}

impl Updater {
    /// Creates an updater with the ANSI script splitter and no membership adapter.
    pub fn new() -> Self {
        UpdaterBuilder::new().build()
    }

    /// Creates a new updater builder.
    pub fn builder() -> UpdaterBuilder {
        UpdaterBuilder::new()
    }

    /// Executes every step of `manifest`.
    ///
    /// Failed steps are reported as [`StepState::Failed`] in the report and
    /// as [`UpdateError::StepFailed`] in the [`RunFailure`]. With
    /// [`FailurePolicy::Halt`] the run stops at the first failure; with
    /// [`FailurePolicy::Continue`] later steps still run and every failure
    /// is returned.
    pub fn execute(
        &self,
        ctx: &mut UpdateContext,
        manifest: &UpdateManifest,
    ) -> std::result::Result<RunReport, RunFailure> {
        manifest.validate().map_err(|e| RunFailure {
            report: RunReport::default(),
            errors: vec![e],
        })?;

        let policy = ctx.config().failure_policy;
        let mut report = RunReport::default();
        let mut errors = Vec::new();

        ctx.logger().trace_information(format_args!(
            "Updating assembly '{}' ({} steps)",
            manifest.assembly,
            manifest.step_count()
        ));

        for (identity, step) in manifest.steps() {
            let state = match self.execute_step(ctx, identity.clone(), step) {
                Ok(state) => {
                    ctx.logger()
                        .trace_information(format_args!("Step {} {}", identity, state));
                    state
                }
                Err(e) => {
                    ctx.logger()
                        .trace_warning(format_args!("Step {} failed: {}", identity, e));
                    let state = StepState::Failed {
                        reason: e.to_string(),
                    };
                    errors.push(UpdateError::step_failed(identity.clone(), e));
                    state
                }
            };

            let halt = matches!(state, StepState::Failed { .. }) && policy == FailurePolicy::Halt;
            report.steps.push(StepReport {
                identity,
                friendly_name: step.friendly_name.clone(),
                state,
            });
            if halt {
                break;
            }
        }

        if errors.is_empty() {
            Ok(report)
        } else {
            Err(RunFailure { report, errors })
        }
    }

    /// Runs a single step identified by `identity`.
    ///
    /// The identity is current on the context while preconditions and the
    /// step body run, and cleared afterwards.
    pub fn execute_step(
        &self,
        ctx: &mut UpdateContext,
        identity: StepIdentity,
        step: &DeclaredStep,
    ) -> Result<StepState> {
        ctx.enter_step(identity.clone(), step.friendly_name.clone());
        let result = self.run_step(ctx, &identity, step);
        ctx.leave_step();
        result
    }

    fn run_step(
        &self,
        ctx: &UpdateContext,
        identity: &StepIdentity,
        step: &DeclaredStep,
    ) -> Result<StepState> {
        ctx.logger().trace_information(format_args!(
            "Checking preconditions of step {} ({})",
            identity,
            step.label()
        ));

        if let Some(precondition) = ctx.evaluate_preconditions(&step.preconditions)? {
            return Ok(StepState::PreconditionFailed { precondition });
        }

        ctx.logger()
            .trace_information(format_args!("Executing step {}", identity));

        let database = ctx.database()?;
        let mut body = || self.dispatcher.dispatch(ctx, &step.kind);
        let execution = database.execute_step(identity, step.mark_as_executed, &mut body)?;

        Ok(match execution {
            StepExecution::Executed => StepState::Completed {
                recorded: step.mark_as_executed,
            },
            StepExecution::Skipped => StepState::Skipped,
        })
    }
}

/// Builder for constructing [`Updater`] instances.
pub struct UpdaterBuilder {
    splitter: Box<dyn ScriptSplitter>,
    membership: Option<Arc<dyn MembershipAdapter>>,
}

impl Default for UpdaterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdaterBuilder {
    /// Creates a builder with the ANSI script splitter.
    pub fn new() -> Self {
        Self {
            splitter: Box::new(SqlScriptSplitter::ansi()),
            membership: None,
        }
    }

    /// Sets the splitter used for SQL steps.
    pub fn script_splitter(mut self, splitter: impl ScriptSplitter + 'static) -> Self {
        self.splitter = Box::new(splitter);
        self
    }

    /// Sets the adapter used for account and role steps.
    pub fn membership_adapter(mut self, adapter: Arc<dyn MembershipAdapter>) -> Self {
        self.membership = Some(adapter);
        self
    }

    /// Builds the updater.
    pub fn build(self) -> Updater {
        Updater {
            dispatcher: StepDispatcher::new(self.splitter, self.membership),
        }
    }
}
