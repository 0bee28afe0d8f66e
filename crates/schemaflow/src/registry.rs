//! Entity version registry.
//!
//! Startup code registers every entity shape version here, in any order;
//! the runner consumes a snapshot sorted by entity name and version.
//! There is no global state: the registry is owned and passed explicitly.

use crate::error::{MigrateError, Result};
use crate::model::EntityShape;

/// One registered shape version of an entity.
#[derive(Debug, Clone)]
pub struct EntityVersion {
    /// Entity name.
    pub name: String,
    /// Version string. Globally unique: it keys the ledger and the
    /// generated script filenames.
    pub version: String,
    /// Shape declared at this version.
    pub current: EntityShape,
    /// Shape of the preceding version, absent for the initial version.
    pub previous: Option<EntityShape>,
}

/// Ordered collection of entity shape versions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    versions: Vec<EntityVersion>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shape version.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::DuplicateVersion`] when the version string
    /// is already registered, for any entity.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        current: EntityShape,
        previous: Option<EntityShape>,
    ) -> Result<()> {
        let version = version.into();
        if self.versions.iter().any(|v| v.version == version) {
            return Err(MigrateError::DuplicateVersion { version });
        }
        self.versions.push(EntityVersion {
            name: name.into(),
            version,
            current,
            previous,
        });
        Ok(())
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Number of registered versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns a snapshot of all versions, sorted by entity name and then
    /// version string. Registration order does not matter.
    #[must_use]
    pub fn get_all(&self) -> Vec<&EntityVersion> {
        let mut versions: Vec<&EntityVersion> = self.versions.iter().collect();
        versions.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));
        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{uuid, EntityShape};

    fn users_v1() -> EntityShape {
        EntityShape::new("users").field(uuid("id").primary_key())
    }

    #[test]
    fn snapshot_sorts_by_name_then_version() {
        let mut registry = Registry::new();
        registry
            .register("user", "1.0.2", users_v1(), Some(users_v1()))
            .unwrap();
        registry
            .register("item", "1.0.1", users_v1(), None)
            .unwrap();
        registry.register("user", "1.0.0", users_v1(), None).unwrap();

        let order: Vec<(&str, &str)> = registry
            .get_all()
            .iter()
            .map(|v| (v.name.as_str(), v.version.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("item", "1.0.1"), ("user", "1.0.0"), ("user", "1.0.2")]
        );
    }

    #[test]
    fn duplicate_version_strings_are_rejected_across_entities() {
        let mut registry = Registry::new();
        registry.register("user", "1.0.0", users_v1(), None).unwrap();

        let result = registry.register("item", "1.0.0", users_v1(), None);
        assert!(matches!(
            result,
            Err(MigrateError::DuplicateVersion { version }) if version == "1.0.0"
        ));
    }

    #[test]
    fn empty_registry_reports_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
