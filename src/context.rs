//! Execution state of an update run.
//!
//! Construction is two-phase: an [`UpdateContextBuilder`] collects services,
//! preconditions and custom step handlers, then
//! [`UpdateContextBuilder::initialize_database_service`] resolves the active
//! logging and database services and returns a bound [`UpdateContext`].

use crate::config::UpdateConfig;
use crate::error::{Result, ServiceKind, UpdateError};
use crate::extension::{BuiltinExtension, Extension};
use crate::identity::StepIdentity;
use crate::precondition::{Precondition, PreconditionDeclaration};
use crate::registry::Registry;
use crate::services::{CustomStep, DatabaseService, LoggingService, ScriptProviderService};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Unbound update context collecting registrations.
///
/// # Examples
///
/// ```
/// use schemakeeper::{ErrorKind, UpdateConfig, UpdateContextBuilder};
///
/// let builder = UpdateContextBuilder::with_builtins(UpdateConfig::default())?;
/// let err = builder.initialize_database_service("Data Source=app.db").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::MappingNotFound);
/// # Ok::<(), schemakeeper::UpdateError>(())
/// ```
pub struct UpdateContextBuilder {
    config: UpdateConfig,
    logging_services: Registry<dyn LoggingService>,
    database_services: Registry<dyn DatabaseService>,
    script_providers: Registry<dyn ScriptProviderService>,
    preconditions: Registry<dyn Precondition>,
    custom_steps: Registry<dyn CustomStep>,
    logger: Option<Arc<dyn LoggingService>>,
}

impl fmt::Debug for UpdateContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContextBuilder")
            .field("config", &self.config)
            .field("logging_services", &self.logging_services)
            .field("database_services", &self.database_services)
            .field("script_providers", &self.script_providers)
            .field("preconditions", &self.preconditions)
            .field("custom_steps", &self.custom_steps)
            .finish()
    }
}

impl Default for UpdateContextBuilder {
    fn default() -> Self {
        Self::new(UpdateConfig::default())
    }
}

impl UpdateContextBuilder {
    /// Creates a builder without any registrations.
    pub fn new(config: UpdateConfig) -> Self {
        Self {
            config,
            logging_services: Registry::new(ServiceKind::Logging),
            database_services: Registry::new(ServiceKind::Database),
            script_providers: Registry::new(ServiceKind::ScriptProvider),
            preconditions: Registry::new(ServiceKind::Precondition),
            custom_steps: Registry::new(ServiceKind::CustomStep),
            logger: None,
        }
    }

    /// Creates a builder with the [`BuiltinExtension`] loaded.
    pub fn with_builtins(config: UpdateConfig) -> Result<Self> {
        let mut builder = Self::new(config);
        builder.load_extension(&BuiltinExtension)?;
        Ok(builder)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Lets `extension` register its services.
    pub fn load_extension(&mut self, extension: &dyn Extension) -> Result<()> {
        extension.initialize(self)
    }

    /// Registers a logging service.
    pub fn register_logging_service(
        &mut self,
        service: impl LoggingService + 'static,
    ) -> Result<()> {
        self.logging_services.register(Arc::new(service))
    }

    /// Registers a database service prototype.
    pub fn register_database_service(
        &mut self,
        service: impl DatabaseService + 'static,
    ) -> Result<()> {
        self.database_services.register(Arc::new(service))
    }

    /// Registers a script provider.
    pub fn register_script_provider(
        &mut self,
        provider: impl ScriptProviderService + 'static,
    ) -> Result<()> {
        self.script_providers.register(Arc::new(provider))
    }

    /// Registers a precondition.
    pub fn register_precondition(&mut self, precondition: impl Precondition + 'static) -> Result<()> {
        self.preconditions.register(Arc::new(precondition))
    }

    /// Registers a custom step handler.
    pub fn register_custom_step(&mut self, step: impl CustomStep + 'static) -> Result<()> {
        self.custom_steps.register(Arc::new(step))
    }

    /// Selects the logging service by name.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InvalidArgument`] if `name` is empty
    /// - [`UpdateError::InvalidOperation`] if no logging service is registered under `name`
    pub fn initialize_logging_service(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(UpdateError::invalid_argument(
                "logging service name must be specified",
            ));
        }

        let service = self.logging_services.resolve(name).map_err(|_| {
            UpdateError::invalid_operation(format!(
                "cannot initialize logging service '{}': not registered",
                name
            ))
        })?;
        self.logger = Some(service);
        Ok(())
    }

    fn active_logger(&mut self) -> Result<Arc<dyn LoggingService>> {
        if self.logger.is_none() {
            let name = self.config.logging_service.clone().ok_or_else(|| {
                UpdateError::invalid_operation("no logging service configured")
            })?;
            self.initialize_logging_service(&name)?;
        }

        self.logger
            .clone()
            .ok_or_else(|| UpdateError::invalid_operation("no logging service initialized"))
    }

    /// Resolves the database service mapped to `connection_string` and binds
    /// the context to it.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InvalidArgument`] if `connection_string` is empty
    /// - [`UpdateError::InvalidOperation`] if no logging service can be resolved
    /// - [`UpdateError::MappingNotFound`] if no mapping matches
    /// - [`UpdateError::NotRegistered`] if the mapped service has no prototype
    /// - [`UpdateError::NotFound`] if a default precondition is not registered
    /// - any error of [`DatabaseService::clone_for_connection_string`]
    pub fn initialize_database_service(mut self, connection_string: &str) -> Result<UpdateContext> {
        if connection_string.is_empty() {
            return Err(UpdateError::invalid_argument(
                "connection string must be specified",
            ));
        }

        let logger = self.active_logger()?;
        logger.trace_information(format_args!(
            "Searching database service for connection string '{}'",
            connection_string
        ));

        let service_name = self
            .config
            .database_service_for(connection_string)
            .ok_or_else(|| UpdateError::MappingNotFound(connection_string.to_string()))?
            .to_string();

        if !self.database_services.contains(&service_name) {
            return Err(UpdateError::NotRegistered(service_name));
        }
        let prototype = self.database_services.resolve(&service_name)?;

        logger.trace_information(format_args!(
            "Found database service '{}' for connection string '{}'",
            service_name, connection_string
        ));

        for declaration in &self.config.default_preconditions {
            self.preconditions.resolve(&declaration.name)?;
        }

        let database = prototype.clone_for_connection_string(connection_string)?;

        logger.trace_information(format_args!(
            "Database service initialized for connection string '{}'",
            connection_string
        ));

        Ok(UpdateContext {
            config: self.config,
            connection_string: connection_string.to_string(),
            logger,
            database,
            disposed: false,
            script_providers: self.script_providers,
            preconditions: self.preconditions,
            custom_steps: self.custom_steps,
            current_step: None,
            friendly_name: None,
        })
    }
}

/// Bound execution state of one update run.
///
/// Owns the active database service exclusively; it is released by
/// [`UpdateContext::dispose`] or when the context is dropped. The context is
/// not meant to be shared between concurrent runs.
pub struct UpdateContext {
    config: UpdateConfig,
    connection_string: String,
    logger: Arc<dyn LoggingService>,
    database: Box<dyn DatabaseService>,
    disposed: bool,
    script_providers: Registry<dyn ScriptProviderService>,
    preconditions: Registry<dyn Precondition>,
    custom_steps: Registry<dyn CustomStep>,
    current_step: Option<StepIdentity>,
    friendly_name: Option<String>,
}

impl fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("connection_string", &self.connection_string)
            .field("logger", &self.logger.name())
            .field("database", &self.database.name())
            .field("disposed", &self.disposed)
            .field("current_step", &self.current_step)
            .finish()
    }
}

impl UpdateContext {
    /// Returns the configuration the context was built with.
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Returns the connection string the database service is bound to.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Returns the active logging service.
    pub fn logger(&self) -> &dyn LoggingService {
        self.logger.as_ref()
    }

    /// Returns the active database service.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InvalidOperation`] after [`UpdateContext::dispose`].
    pub fn database(&self) -> Result<&dyn DatabaseService> {
        if self.disposed {
            return Err(UpdateError::invalid_operation(
                "database service has been disposed",
            ));
        }
        Ok(self.database.as_ref())
    }

    /// Evaluates the registered precondition `name` for the current step.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InvalidArgument`] if `name` is empty or the predicate rejects `params`
    /// - [`UpdateError::NotFound`] if `name` is not registered
    pub fn check_precondition(&self, name: &str, params: &[String]) -> Result<bool> {
        if name.is_empty() {
            return Err(UpdateError::invalid_argument(
                "precondition name must be specified",
            ));
        }

        self.preconditions.resolve(name)?.check(self, params)
    }

    /// Evaluates the default preconditions, then `preconditions`, in order.
    ///
    /// Stops at the first predicate that does not hold and returns its
    /// label; returns `None` when all hold.
    pub fn evaluate_preconditions(
        &self,
        preconditions: &[PreconditionDeclaration],
    ) -> Result<Option<String>> {
        for declaration in self.config.default_preconditions.iter().chain(preconditions) {
            let holds = self.check_precondition(&declaration.name, &declaration.params)?;
            debug!(
                "Precondition '{}' evaluated to {}",
                declaration.label(),
                holds
            );

            if !holds {
                return Ok(Some(declaration.label().to_string()));
            }
        }
        Ok(None)
    }

    /// Returns the script at `location` from the script provider `provider`.
    pub fn script(&self, provider: &str, location: &str) -> Result<String> {
        if provider.is_empty() {
            return Err(UpdateError::invalid_argument(
                "script provider name must be specified",
            ));
        }
        if location.is_empty() {
            return Err(UpdateError::invalid_argument(
                "script location must be specified",
            ));
        }

        self.script_providers.resolve(provider)?.get_script(location)
    }

    /// Returns the custom step handler registered under `name`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::TypeNotFound`] if no handler is registered under `name`.
    pub fn custom_step(&self, name: &str) -> Result<Arc<dyn CustomStep>> {
        self.custom_steps
            .resolve(name)
            .map_err(|_| UpdateError::TypeNotFound(name.to_string()))
    }

    /// Returns the identity of the step being processed.
    pub fn current_step(&self) -> Option<&StepIdentity> {
        self.current_step.as_ref()
    }

    /// Returns the assembly of the step being processed.
    pub fn current_assembly_name(&self) -> Option<&str> {
        self.current_step.as_ref().map(StepIdentity::assembly)
    }

    /// Returns the version of the step being processed.
    pub fn current_version(&self) -> Option<&str> {
        self.current_step.as_ref().map(StepIdentity::version)
    }

    /// Returns the number of the step being processed.
    pub fn current_step_number(&self) -> Option<u32> {
        self.current_step.as_ref().map(StepIdentity::step)
    }

    /// Returns the friendly name of the step being processed.
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub(crate) fn enter_step(&mut self, identity: StepIdentity, friendly_name: Option<String>) {
        self.current_step = Some(identity);
        self.friendly_name = friendly_name;
    }

    pub(crate) fn leave_step(&mut self) {
        self.current_step = None;
        self.friendly_name = None;
    }

    /// Returns `true` once the database service has been released.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Releases the database service.
    ///
    /// Only the first call reaches the service; later calls return `Ok(())`.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        self.disposed = true;
        debug!("Disposing database service '{}'", self.database.name());
        self.database.dispose()
    }
}

impl Drop for UpdateContext {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!("Failed to dispose database service: {}", e);
        }
    }
}
