use std::collections::BTreeMap;

use crate::coordinate::{Coordinate, ModuleKey};
use crate::version::Version;

/// A platform (BOM): recommended exact versions per module.
///
/// A set may extend other sets; its own recommendations override the ones it
/// inherits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSet {
    /// Name used by `platform` and `extends` references.
    pub name: String,
    /// Identity of the published BOM.
    pub coordinate: Coordinate,
    pub extends: Vec<String>,
    pub recommendations: BTreeMap<ModuleKey, Version>,
}

impl ConstraintSet {
    pub fn new(name: &str, coordinate: Coordinate) -> Self {
        Self {
            name: name.to_string(),
            coordinate,
            extends: Vec::new(),
            recommendations: BTreeMap::new(),
        }
    }

    pub fn extending(mut self, parent: &str) -> Self {
        self.extends.push(parent.to_string());
        self
    }

    pub fn recommend(mut self, group: &str, name: &str, version: &str) -> Self {
        self.recommendations
            .insert(ModuleKey::new(group, name), Version::parse(version));
        self
    }

    pub fn recommendation(&self, key: &ModuleKey) -> Option<&Version> {
        self.recommendations.get(key)
    }
}
