use crate::context::UpdateContextBuilder;
use crate::error::Result;
use crate::precondition::{ObjectNotFound, StepNotExecuted, TableNotFound, ViewNotFound};
use crate::services::TracingLoggingService;

/// Bundle of services registered together.
///
/// Database adapters, logging backends and custom step libraries expose an
/// extension so callers can register everything they provide in one call to
/// [`UpdateContextBuilder::load_extension`].
pub trait Extension {
    /// Registers the services provided by this extension.
    fn initialize(&self, builder: &mut UpdateContextBuilder) -> Result<()>;
}

/// Services shipped with the crate.
///
/// Registers the `"tracing"` logging service and the `StepNotExecuted`,
/// `ObjectNotFound`, `TableNotFound` and `ViewNotFound` preconditions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinExtension;

impl Extension for BuiltinExtension {
    fn initialize(&self, builder: &mut UpdateContextBuilder) -> Result<()> {
        builder.register_logging_service(TracingLoggingService::new())?;
        builder.register_precondition(StepNotExecuted)?;
        builder.register_precondition(ObjectNotFound)?;
        builder.register_precondition(TableNotFound)?;
        builder.register_precondition(ViewNotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateConfig;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtins_cannot_be_loaded_twice() {
        let mut builder = UpdateContextBuilder::with_builtins(UpdateConfig::default()).unwrap();
        let err = builder.load_extension(&BuiltinExtension).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
    }

    #[test]
    fn test_builtin_logger_is_resolvable() {
        let mut builder = UpdateContextBuilder::with_builtins(UpdateConfig::default()).unwrap();
        assert!(builder.initialize_logging_service("tracing").is_ok());
    }
}
