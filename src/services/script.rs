use crate::error::{Result, UpdateError};
use crate::registry::Named;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Source of SQL scripts referenced by location.
pub trait ScriptProviderService: Send + Sync {
    /// Registration name.
    fn name(&self) -> &str;

    /// Returns the script stored at `location`.
    fn get_script(&self, location: &str) -> Result<String>;
}

impl Named for dyn ScriptProviderService {
    fn name(&self) -> &str {
        ScriptProviderService::name(self)
    }
}

/// Reads scripts from files below a base directory.
///
/// Locations are relative paths; absolute paths and `..` components are
/// rejected so a manifest cannot read outside the base directory.
#[derive(Debug, Clone)]
pub struct FileScriptProvider {
    base_dir: PathBuf,
}

impl FileScriptProvider {
    pub const NAME: &'static str = "file";

    /// Creates a provider rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn failure(&self, location: &str, details: impl Into<String>) -> UpdateError {
        UpdateError::ScriptProvider {
            provider: Self::NAME.to_string(),
            location: location.to_string(),
            details: details.into(),
        }
    }
}

impl ScriptProviderService for FileScriptProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_script(&self, location: &str) -> Result<String> {
        if location.is_empty() {
            return Err(UpdateError::invalid_argument("script location must be specified"));
        }

        let relative = Path::new(location);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(self.failure(location, "location must stay inside the base directory"));
        }

        fs::read_to_string(self.base_dir.join(relative))
            .map_err(|e| self.failure(location, e.to_string()))
    }
}
