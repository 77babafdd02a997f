//! Commonly used types and traits

pub use crate::config::{FailurePolicy, UpdateConfig};
pub use crate::context::{UpdateContext, UpdateContextBuilder};
pub use crate::define_custom_step;
pub use crate::error::{ErrorKind, Result, UpdateError};
pub use crate::extension::{BuiltinExtension, Extension};
pub use crate::identity::StepIdentity;
pub use crate::manifest::{UpdateManifest, VersionUpdate};
pub use crate::precondition::{Precondition, PreconditionDeclaration};
pub use crate::services::{
    CustomStep, DatabaseService, LoggingService, MembershipAdapter, ScriptProviderService,
};
pub use crate::splitter::{ScriptSplitter, SqlScriptSplitter};
pub use crate::step::{DeclaredStep, SqlAlternative, StepExecution, StepState, UpdateStep};
pub use crate::updater::{RunFailure, RunReport, Updater};
