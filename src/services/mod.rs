//! Collaborator interfaces consumed by the update core, and the built-in
//! implementations shipped with the crate.

mod custom;
mod database;
mod logging;
mod membership;
mod script;

pub use custom::CustomStep;
pub use database::DatabaseService;
pub use logging::{LoggingService, TracingLoggingService};
pub use membership::MembershipAdapter;
pub use script::{FileScriptProvider, ScriptProviderService};
