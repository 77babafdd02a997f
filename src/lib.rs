//! # schemakeeper
//!
//! A database schema and version migration engine for Rust.
//!
//! Update steps are declared per assembly and version and applied against a
//! target database exactly once each. Completion is tracked by the database
//! service, so running the same manifest again is a no-op.
//!
//! ## Features
//!
//! - **Pluggable backends**: SQL dialects, logging and script sources are
//!   services registered by name on an [`UpdateContextBuilder`]
//! - **Preconditions**: named predicates such as [`StepNotExecuted`] and
//!   [`ObjectNotFound`] gate each step
//! - **Per-dialect SQL**: a step carries alternatives per dialect with an
//!   `"all"` fallback; steps without a usable alternative are skipped
//! - **Custom steps**: named [`CustomStep`] handlers for logic plain SQL
//!   cannot express
//! - **Error Handling**: one [`UpdateError`] type built with `thiserror`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemakeeper::prelude::*;
//!
//! let mut builder = UpdateContextBuilder::with_builtins(
//!     UpdateConfig::default()
//!         .with_mapping("Data Source=app.db", "sqlite")
//!         .with_default_precondition(PreconditionDeclaration::new("StepNotExecuted")),
//! )?;
//! builder.register_database_service(MySqliteService::default())?;
//!
//! let mut ctx = builder.initialize_database_service("Data Source=app.db")?;
//!
//! let manifest = UpdateManifest::new("billing").version(
//!     VersionUpdate::new("1.0").step(DeclaredStep::new(
//!         1,
//!         UpdateStep::sql([
//!             SqlAlternative::inline("mysql", "CREATE TABLE invoice (id INT) ENGINE=InnoDB;"),
//!             SqlAlternative::inline("all", "CREATE TABLE invoice (id INT);"),
//!         ]),
//!     )),
//! );
//!
//! match Updater::new().execute(&mut ctx, &manifest) {
//!     Ok(report) => println!("{} steps completed", report.completed()),
//!     Err(failure) => failure.errors.iter().for_each(|e| eprintln!("{}", e)),
//! }
//! ctx.dispose()?;
//! ```
//!
//! ## Error Handling
//!
//! ```rust,ignore
//! if let Err(failure) = Updater::new().execute(&mut ctx, &manifest) {
//!     for error in &failure.errors {
//!         match error.kind() {
//!             ErrorKind::SqlExecution => eprintln!("SQL failed: {}", error),
//!             ErrorKind::TypeNotFound => eprintln!("Unknown custom step: {}", error),
//!             _ => eprintln!("Error: {}", error),
//!         }
//!     }
//! }
//! ```

mod config;
mod context;
mod dispatch;
mod error;
mod extension;
mod identity;
mod manifest;
mod precondition;
mod registry;
mod services;
mod splitter;
mod step;
mod updater;

pub mod prelude;

pub use config::{DatabaseServiceMapping, FailurePolicy, UpdateConfig};
pub use context::{UpdateContext, UpdateContextBuilder};
pub use dispatch::{select_alternative, StepDispatcher};
pub use error::{ErrorKind, Result, ServiceKind, UpdateError};
pub use extension::{BuiltinExtension, Extension};
pub use identity::StepIdentity;
pub use manifest::{UpdateManifest, VersionUpdate};
pub use precondition::{
    ObjectNotFound, Precondition, PreconditionDeclaration, StepNotExecuted, TableNotFound,
    ViewNotFound,
};
pub use registry::{Named, Registry};
pub use services::{
    CustomStep, DatabaseService, FileScriptProvider, LoggingService, MembershipAdapter,
    ScriptProviderService, TracingLoggingService,
};
pub use splitter::{ScriptSplitter, SqlScriptSplitter, Terminator};
pub use step::{
    DeclaredStep, SqlAlternative, SqlSource, StepExecution, StepState, UpdateStep, ALL_DIALECTS,
};
pub use updater::{RunFailure, RunReport, StepReport, Updater, UpdaterBuilder};

/// Macro to define a custom step handler with minimal boilerplate
///
/// This macro creates a unit struct with:
/// - `const NAME: &'static str` - the handler name referenced by
///   [`UpdateStep::Custom`]
/// - `Debug`, `Clone`, `Copy`, `Default` derives
/// - a [`CustomStep`] implementation registered under `NAME` whose
///   `execute_update` runs the given body with the context and parameters
///   bound to the two closure-style names
///
/// # Example
///
/// ```rust
/// use schemakeeper::{define_custom_step, CustomStep};
///
/// define_custom_step!(RebuildSearchIndex, |ctx, params| {
///     let database = ctx.database()?;
///     for index in params {
///         database.execute_sql(&format!("REINDEX {}", index))?;
///     }
///     Ok(())
/// });
///
/// assert_eq!(RebuildSearchIndex::NAME, "RebuildSearchIndex");
/// assert_eq!(RebuildSearchIndex.name(), "RebuildSearchIndex");
/// ```
#[macro_export]
macro_rules! define_custom_step {
    ($name:ident, |$ctx:ident, $params:ident| $body:block) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            /// Handler name as a compile-time constant
            #[allow(dead_code)]
            pub const NAME: &'static str = stringify!($name);
        }

        impl $crate::CustomStep for $name {
            fn name(&self) -> &str {
                Self::NAME
            }

            fn execute_update(
                &self,
                $ctx: &$crate::UpdateContext,
                $params: &[::std::string::String],
            ) -> $crate::Result<()> $body
        }
    };
}
