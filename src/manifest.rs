use crate::error::{Result, UpdateError};
use crate::identity::StepIdentity;
use crate::step::DeclaredStep;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Steps of one version, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionUpdate {
    pub version: String,
    #[serde(default)]
    pub steps: Vec<DeclaredStep>,
}

impl VersionUpdate {
    /// Creates an empty version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn step(mut self, step: DeclaredStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Ordered update declarations of one assembly.
///
/// Loading a manifest from XML, JSON or any other format is left to the
/// caller; the types derive `serde` traits for that purpose.
///
/// # Examples
///
/// ```
/// use schemakeeper::{DeclaredStep, SqlAlternative, UpdateManifest, UpdateStep, VersionUpdate};
///
/// let manifest = UpdateManifest::new("billing").version(
///     VersionUpdate::new("1.0")
///         .step(DeclaredStep::new(1, UpdateStep::sql([
///             SqlAlternative::inline("all", "CREATE TABLE invoice (id INT);"),
///         ]))),
/// );
///
/// manifest.validate()?;
/// let ids: Vec<String> = manifest.steps().map(|(id, _)| id.to_string()).collect();
/// assert_eq!(ids, vec!["billing/1.0/1"]);
/// # Ok::<(), schemakeeper::UpdateError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    pub assembly: String,
    #[serde(default)]
    pub versions: Vec<VersionUpdate>,
}

impl UpdateManifest {
    /// Creates an empty manifest for `assembly`.
    pub fn new(assembly: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            versions: Vec::new(),
        }
    }

    /// Appends a version.
    pub fn version(mut self, version: VersionUpdate) -> Self {
        self.versions.push(version);
        self
    }

    /// Checks the structural rules a run relies on.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InvalidConfiguration`] if the assembly or a version is
    /// unnamed, or a step id is repeated within a version.
    pub fn validate(&self) -> Result<()> {
        if self.assembly.is_empty() {
            return Err(UpdateError::invalid_configuration(
                "manifest assembly name must not be empty",
            ));
        }

        for version in &self.versions {
            if version.version.is_empty() {
                return Err(UpdateError::invalid_configuration(format!(
                    "version name must not be empty in assembly '{}'",
                    self.assembly
                )));
            }

            let mut seen = HashSet::new();
            for step in &version.steps {
                if !seen.insert(step.id) {
                    return Err(UpdateError::invalid_configuration(format!(
                        "step {} is declared twice in {} {}",
                        step.id, self.assembly, version.version
                    )));
                }
            }
        }
        Ok(())
    }

    /// Iterates all steps in declaration order with their identities.
    pub fn steps(&self) -> impl Iterator<Item = (StepIdentity, &DeclaredStep)> {
        self.versions.iter().flat_map(move |version| {
            version.steps.iter().map(move |step| {
                (
                    StepIdentity::new(&self.assembly, &version.version, step.id),
                    step,
                )
            })
        })
    }

    /// Returns the total number of declared steps.
    pub fn step_count(&self) -> usize {
        self.versions.iter().map(|v| v.steps.len()).sum()
    }
}
