use crate::error::{Result, ServiceKind, UpdateError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Anything that can be registered under its own name.
pub trait Named {
    /// Registration key; must be non-empty.
    fn name(&self) -> &str;
}

/// Name-keyed registry of services of one [`ServiceKind`].
///
/// Names are unique and immutable once registered. Registries of different
/// kinds are independent namespaces.
///
/// # Examples
///
/// ```
/// use schemakeeper::{ErrorKind, LoggingService, Registry, ServiceKind, TracingLoggingService};
/// use std::sync::Arc;
///
/// let mut registry: Registry<dyn LoggingService> = Registry::new(ServiceKind::Logging);
/// registry.register(Arc::new(TracingLoggingService::new()))?;
///
/// let duplicate = registry.register(Arc::new(TracingLoggingService::new()));
/// assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::DuplicateName);
/// assert!(registry.resolve("tracing").is_ok());
/// # Ok::<(), schemakeeper::UpdateError>(())
/// ```
pub struct Registry<T: ?Sized> {
    kind: ServiceKind,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized + Named> Registry<T> {
    /// Creates an empty registry for `kind`.
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Returns the kind of entries held by this registry.
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Registers `entry` under its own name.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InvalidConfiguration`] if the name is empty
    /// - [`UpdateError::DuplicateName`] if the name is already taken
    pub fn register(&mut self, entry: Arc<T>) -> Result<()> {
        let name = Named::name(&*entry).to_string();
        if name.is_empty() {
            return Err(UpdateError::invalid_configuration(format!(
                "{} name must not be empty",
                self.kind
            )));
        }
        if self.entries.contains_key(&name) {
            return Err(UpdateError::DuplicateName {
                kind: self.kind,
                name,
            });
        }

        debug!("Registered {} '{}'", self.kind, name);
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Returns the entry registered under `name`.
    ///
    /// # Errors
    ///
    /// [`UpdateError::NotFound`] if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<T>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| UpdateError::NotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns an iterator over all registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
