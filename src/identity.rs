use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique key of one update step.
///
/// A step is identified by the assembly (module) that declares it, the
/// version it belongs to and its ordinal number inside that version. The
/// database service keys its completion records by this tuple.
///
/// # Examples
///
/// ```
/// use schemakeeper::StepIdentity;
///
/// let id = StepIdentity::new("billing", "1.2", 4);
/// assert_eq!(id.assembly(), "billing");
/// assert_eq!(id.to_string(), "billing/1.2/4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepIdentity {
    assembly: String,
    version: String,
    step: u32,
}

impl StepIdentity {
    /// Creates a new StepIdentity
    pub fn new(assembly: impl Into<String>, version: impl Into<String>, step: u32) -> Self {
        Self {
            assembly: assembly.into(),
            version: version.into(),
            step,
        }
    }

    /// Returns the assembly name
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    /// Returns the version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the step number within the version
    pub fn step(&self) -> u32 {
        self.step
    }
}

impl fmt::Display for StepIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.assembly, self.version, self.step)
    }
}
