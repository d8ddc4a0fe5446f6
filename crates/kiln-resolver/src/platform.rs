//! Platform (constraint set) validation, flattening and conflict arbitration.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use kiln_core::constraint::ConstraintSet;
use kiln_core::coordinate::ModuleKey;
use kiln_core::version::Version;

use crate::error::ResolutionError;

/// Validated constraint sets with their `extends` chains flattened.
#[derive(Debug)]
pub struct Platforms<'a> {
    sets: &'a [ConstraintSet],
    by_name: HashMap<&'a str, usize>,
    flattened: Vec<BTreeMap<ModuleKey, Version>>,
    ancestors: Vec<BTreeSet<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    InProgress,
    Done,
}

impl<'a> Platforms<'a> {
    /// Validate names and `extends` references, then flatten every set.
    ///
    /// A set inherits the recommendations of the sets it extends, in
    /// `extends` order, and its own entries override them.
    pub fn new(sets: &'a [ConstraintSet]) -> Result<Self, ResolutionError> {
        let mut by_name = HashMap::new();
        for (i, set) in sets.iter().enumerate() {
            if by_name.insert(set.name.as_str(), i).is_some() {
                return Err(ResolutionError::DuplicateConstraintSet {
                    name: set.name.clone(),
                });
            }
        }
        for set in sets {
            for parent in &set.extends {
                if !by_name.contains_key(parent.as_str()) {
                    return Err(ResolutionError::UnknownConstraintSet {
                        name: parent.clone(),
                        referenced_by: format!("platform `{}`", set.name),
                    });
                }
            }
        }

        let mut platforms = Self {
            sets,
            by_name,
            flattened: vec![BTreeMap::new(); sets.len()],
            ancestors: vec![BTreeSet::new(); sets.len()],
        };
        let mut states = vec![State::Unvisited; sets.len()];
        let mut stack = Vec::new();
        for i in 0..sets.len() {
            if states[i] == State::Unvisited {
                platforms.flatten(i, &mut states, &mut stack)?;
            }
        }
        Ok(platforms)
    }

    fn flatten(
        &mut self,
        i: usize,
        states: &mut [State],
        stack: &mut Vec<usize>,
    ) -> Result<(), ResolutionError> {
        states[i] = State::InProgress;
        stack.push(i);

        let sets = self.sets;
        let set = &sets[i];
        let mut merged = BTreeMap::new();
        let mut ancestors = BTreeSet::new();
        for parent in &set.extends {
            let Some(&j) = self.by_name.get(parent.as_str()) else {
                continue;
            };
            match states[j] {
                State::InProgress => {
                    let start = stack.iter().position(|&s| s == j).unwrap_or(0);
                    return Err(ResolutionError::CyclicDependency {
                        cycle: stack[start..]
                            .iter()
                            .map(|&s| self.sets[s].coordinate.clone())
                            .collect(),
                    });
                }
                State::Unvisited => self.flatten(j, states, stack)?,
                State::Done => {}
            }
            merged.extend(
                self.flattened[j]
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            ancestors.insert(j);
            ancestors.extend(self.ancestors[j].iter().copied());
        }
        merged.extend(
            set.recommendations
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        tracing::debug!(
            "platform {} flattened to {} recommendations",
            set.name,
            merged.len()
        );
        self.flattened[i] = merged;
        self.ancestors[i] = ancestors;
        stack.pop();
        states[i] = State::Done;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&'a ConstraintSet> {
        let sets = self.sets;
        self.by_name.get(name).map(|&i| &sets[i])
    }

    /// The effective recommendation of `platform` for `key`, inherited ones included.
    pub fn recommendation(&self, platform: &str, key: &ModuleKey) -> Option<&Version> {
        let &i = self.by_name.get(platform)?;
        self.flattened[i].get(key)
    }

    /// All effective recommendations of `platform`.
    pub fn flattened(&self, platform: &str) -> Option<&BTreeMap<ModuleKey, Version>> {
        self.by_name.get(platform).map(|&i| &self.flattened[i])
    }

    /// Whether `set` transitively extends `ancestor`.
    pub fn extends(&self, set: &str, ancestor: &str) -> bool {
        match (self.by_name.get(set), self.by_name.get(ancestor)) {
            (Some(&s), Some(a)) => self.ancestors[s].contains(a),
            _ => false,
        }
    }

    /// The referenced sets plus everything they extend, in declaration order.
    pub fn in_scope<'n>(&self, referenced: impl IntoIterator<Item = &'n str>) -> Vec<&'a str> {
        let mut selected = BTreeSet::new();
        for name in referenced {
            if let Some(&i) = self.by_name.get(name) {
                selected.insert(i);
                selected.extend(self.ancestors[i].iter().copied());
            }
        }
        let sets = self.sets;
        selected
            .into_iter()
            .map(|i| sets[i].name.as_str())
            .collect()
    }

    /// Pick the version the in-scope sets recommend for a contested module.
    ///
    /// Sets are consulted in declaration order and a later set overrides the
    /// current pick, unless the set behind the current pick extends it.
    pub fn arbitrate(&self, scope: &[&str], key: &ModuleKey) -> Option<(&'a str, Version)> {
        let mut winner: Option<(usize, &Version)> = None;
        for name in scope {
            let Some(&i) = self.by_name.get(name) else {
                continue;
            };
            let Some(version) = self.flattened[i].get(key) else {
                continue;
            };
            winner = match winner {
                Some((w, v)) if self.ancestors[w].contains(&i) => Some((w, v)),
                _ => Some((i, version)),
            };
        }
        let sets = self.sets;
        winner.map(|(i, v)| (sets[i].name.as_str(), v.clone()))
    }
}
