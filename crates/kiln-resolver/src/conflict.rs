//! Requests that a platform moved to a different version.

use std::collections::BTreeMap;
use std::fmt;

use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::version::Version;

/// One dependency request retargeted during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub module: ModuleKey,
    pub requested_by: Coordinate,
    pub requested: Version,
    pub resolved: Version,
    /// Name of the platform whose recommendation won.
    pub platform: String,
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} for {} (platform `{}`)",
            self.module, self.requested, self.resolved, self.requested_by, self.platform
        )
    }
}

/// All retargeted requests of one resolution, in the order they were decided.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    moved: Vec<VersionConflict>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, moved: impl IntoIterator<Item = VersionConflict>) {
        self.moved.extend(moved);
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionConflict> {
        self.moved.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moved.len()
    }

    /// Distinct modules that had at least one request moved.
    pub fn modules(&self) -> Vec<&ModuleKey> {
        let mut keys: Vec<&ModuleKey> = self.moved.iter().map(|c| &c.module).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.moved.is_empty() {
            return write!(f, "No version conflicts.");
        }
        let mut by_module: BTreeMap<&ModuleKey, Vec<&VersionConflict>> = BTreeMap::new();
        for c in &self.moved {
            by_module.entry(&c.module).or_default().push(c);
        }
        writeln!(f, "Reconciled versions ({} modules):", by_module.len())?;
        for (module, moved) in by_module {
            // every entry of a module shares the same pick
            let pick = moved[0];
            writeln!(f, "  {module} -> {} (platform `{}`)", pick.resolved, pick.platform)?;
            for c in moved {
                writeln!(f, "    {} requested {}", c.requested_by, c.requested)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(by: &str, requested: &str) -> VersionConflict {
        VersionConflict {
            module: ModuleKey::new("org.example", "compress-core"),
            requested_by: Coordinate::new("org.example", by, "1.0.0"),
            requested: Version::parse(requested),
            resolved: Version::parse("1.2.0"),
            platform: "p2".to_string(),
        }
    }

    #[test]
    fn empty_report_says_so() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn report_groups_requests_by_module() {
        let mut report = ConflictReport::new();
        report.extend([moved("app", "1.0.0"), moved("cli", "1.1.0")]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.modules().len(), 1);
        assert_eq!(
            report.to_string(),
            "Reconciled versions (1 modules):\n\
             \x20 org.example:compress-core -> 1.2.0 (platform `p2`)\n\
             \x20   org.example:app:1.0.0 requested 1.0.0\n\
             \x20   org.example:cli:1.0.0 requested 1.1.0\n"
        );
        assert_eq!(
            report.iter().next().map(ToString::to_string).as_deref(),
            Some("org.example:compress-core 1.0.0 -> 1.2.0 for org.example:app:1.0.0 (platform `p2`)")
        );
    }
}
