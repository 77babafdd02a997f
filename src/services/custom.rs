use crate::context::UpdateContext;
use crate::error::Result;
use crate::registry::Named;

/// Handler for [`UpdateStep::Custom`](crate::UpdateStep::Custom) steps.
///
/// Custom steps are the extension point for logic the declarative step
/// kinds cannot express. Handlers are registered ahead of time on the
/// [`UpdateContextBuilder`](crate::UpdateContextBuilder) and referenced by
/// name from the step declaration.
///
/// # Examples
///
/// ```
/// use schemakeeper::{CustomStep, Result, UpdateContext};
///
/// #[derive(Debug)]
/// struct SeedCountries {
///     table: String,
/// }
///
/// impl CustomStep for SeedCountries {
///     fn name(&self) -> &str {
///         "SeedCountries"
///     }
///
///     fn execute_update(&self, ctx: &UpdateContext, params: &[String]) -> Result<()> {
///         let database = ctx.database()?;
///         for code in params {
///             database.execute_sql(&format!("INSERT INTO {} (code) VALUES ('{}')", self.table, code))?;
///         }
///         Ok(())
///     }
/// }
///
/// let step = SeedCountries { table: "country".to_string() };
/// assert_eq!(step.name(), "SeedCountries");
/// ```
///
/// Stateless handlers can be declared with
/// [`define_custom_step!`](crate::define_custom_step) instead.
pub trait CustomStep: Send + Sync {
    /// Name referenced by [`UpdateStep::Custom::handler`](crate::UpdateStep::Custom).
    fn name(&self) -> &str;

    /// Performs the update for the context's current step.
    fn execute_update(&self, ctx: &UpdateContext, params: &[String]) -> Result<()>;
}

impl Named for dyn CustomStep {
    fn name(&self) -> &str {
        CustomStep::name(self)
    }
}
