//! Deterministic build ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kiln_core::coordinate::Coordinate;
use kiln_core::module::Module;
use kiln_resolver::ResolvedGraph;

use crate::fingerprint::{self, Fingerprint};

/// One module in the plan, with everything the executor needs to build it.
#[derive(Debug, Clone)]
pub struct PlannedModule {
    pub coordinate: Coordinate,
    pub module: Module,
    /// Direct dependencies built in this plan.
    pub dependencies: Vec<Coordinate>,
    /// Direct dependencies that are already published.
    pub external_dependencies: Vec<Coordinate>,
    pub fingerprint: Fingerprint,
}

impl PlannedModule {
    /// Every resolved direct dependency, local ones first.
    pub fn all_dependencies(&self) -> Vec<Coordinate> {
        self.dependencies
            .iter()
            .chain(&self.external_dependencies)
            .cloned()
            .collect()
    }
}

/// Local modules in build order: every dependency precedes its dependents.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub steps: Vec<PlannedModule>,
    /// Already-published coordinates the plan relies on.
    pub externals: Vec<Coordinate>,
}

impl BuildPlan {
    pub fn order(&self) -> Vec<&Coordinate> {
        self.steps.iter().map(|s| &s.coordinate).collect()
    }

    pub fn position(&self, coordinate: &Coordinate) -> Option<usize> {
        self.steps.iter().position(|s| &s.coordinate == coordinate)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "{:>3}. {}", i + 1, step.coordinate)?;
            if !step.dependencies.is_empty() {
                let deps: Vec<String> = step.dependencies.iter().map(|d| d.to_string()).collect();
                write!(f, " (after {})", deps.join(", "))?;
            }
            writeln!(f)?;
        }
        if !self.externals.is_empty() {
            writeln!(f, "external:")?;
            for c in &self.externals {
                writeln!(f, "     {c}")?;
            }
        }
        Ok(())
    }
}

/// Order the local modules of a resolved graph with Kahn's algorithm.
///
/// External nodes count as already built. Among modules that are ready at the
/// same time the smallest coordinate goes first, so the same graph always
/// yields the same plan.
pub fn plan(graph: &ResolvedGraph) -> BuildPlan {
    let mut waiting: BTreeMap<Coordinate, usize> = BTreeMap::new();
    let mut ready = BTreeSet::new();
    for module in graph.local_modules() {
        let pending = graph
            .dependencies_of(&module.coordinate)
            .iter()
            .filter(|d| graph.is_local(d))
            .count();
        if pending == 0 {
            ready.insert(module.coordinate.clone());
        } else {
            waiting.insert(module.coordinate.clone(), pending);
        }
    }

    let mut fingerprints: BTreeMap<Coordinate, Fingerprint> = BTreeMap::new();
    let mut steps = Vec::new();
    while let Some(next) = ready.pop_first() {
        for dependent in graph.dependents_of(&next) {
            if let Some(count) = waiting.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    waiting.remove(&dependent);
                    ready.insert(dependent);
                }
            }
        }

        let Some(module) = graph.module(&next) else {
            continue;
        };
        let direct = graph.dependencies_of(&next);
        let inputs: Vec<(&Coordinate, Option<&Fingerprint>)> =
            direct.iter().map(|d| (d, fingerprints.get(d))).collect();
        let fingerprint = fingerprint::compute(module, &inputs);
        let (dependencies, external_dependencies): (Vec<Coordinate>, Vec<Coordinate>) =
            direct.iter().cloned().partition(|d| graph.is_local(d));

        tracing::debug!("plan step {}: {next}", steps.len() + 1);
        fingerprints.insert(next.clone(), fingerprint.clone());
        steps.push(PlannedModule {
            coordinate: next,
            module: module.clone(),
            dependencies,
            external_dependencies,
            fingerprint,
        });
    }

    BuildPlan {
        steps,
        externals: graph.externals(),
    }
}
