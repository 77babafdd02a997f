use crate::registry::Named;
use std::fmt;
use tracing::{info, warn};

/// Side-channel diagnostics sink used by the context and the dispatcher.
///
/// Logging never affects control flow; implementations must not panic.
pub trait LoggingService: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;

    /// Records an informational trace line.
    fn trace_information(&self, message: fmt::Arguments<'_>);

    /// Records a warning.
    fn trace_warning(&self, message: fmt::Arguments<'_>);
}

impl Named for dyn LoggingService {
    fn name(&self) -> &str {
        LoggingService::name(self)
    }
}

/// Forwards trace lines to the `tracing` ecosystem.
///
/// Registered as `"tracing"` by the [`BuiltinExtension`](crate::BuiltinExtension)
/// and selected by the default [`UpdateConfig`](crate::UpdateConfig).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggingService;

impl TracingLoggingService {
    pub const NAME: &'static str = "tracing";

    /// Creates a new TracingLoggingService
    pub fn new() -> Self {
        Self
    }
}

impl LoggingService for TracingLoggingService {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn trace_information(&self, message: fmt::Arguments<'_>) {
        info!(target: "schemakeeper", "{}", message);
    }

    fn trace_warning(&self, message: fmt::Arguments<'_>) {
        warn!(target: "schemakeeper", "{}", message);
    }
}
