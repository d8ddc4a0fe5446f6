//! Module dependency graph construction and traversal.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Deref;

use kiln_core::coordinate::{Coordinate, ModuleKey};
use kiln_core::module::Module;
use kiln_core::version::Version;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::ResolutionError;

/// A node: one coordinate, either declared locally or already published.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub coordinate: Coordinate,
    /// The declaration, for modules built by this workspace.
    pub module: Option<Module>,
}

impl GraphNode {
    pub fn is_local(&self) -> bool {
        self.module.is_some()
    }
}

/// How a dependency edge was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepEdge {
    /// A `group:name` request; subject to version reconciliation.
    Requested,
    /// A project reference bound to one declared module.
    Project,
}

/// Depends-on graph over coordinates, backed by petgraph.
///
/// Edges point from the dependent to the dependency.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DepEdge>,
    index: HashMap<Coordinate, NodeIndex>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a locally declared module. Re-adding a coordinate is a no-op,
    /// except that it turns an external node into a local one.
    pub fn add_module(&mut self, module: Module) -> NodeIndex {
        if let Some(&idx) = self.index.get(&module.coordinate) {
            let node = &mut self.graph[idx];
            if node.module.is_none() {
                node.module = Some(module);
            }
            return idx;
        }
        let coordinate = module.coordinate.clone();
        let idx = self.graph.add_node(GraphNode {
            coordinate: coordinate.clone(),
            module: Some(module),
        });
        self.index.insert(coordinate, idx);
        idx
    }

    /// Register an already-published coordinate.
    pub fn add_external(&mut self, coordinate: Coordinate) -> NodeIndex {
        if let Some(&idx) = self.index.get(&coordinate) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            coordinate: coordinate.clone(),
            module: None,
        });
        self.index.insert(coordinate, idx);
        idx
    }

    /// Record that `from` depends on `to`. Both must already be registered.
    pub fn add_edge(
        &mut self,
        from: &Coordinate,
        to: &Coordinate,
        kind: DepEdge,
    ) -> Result<(), ResolutionError> {
        let Some(&source) = self.index.get(from) else {
            return Err(ResolutionError::UnknownModule {
                module: from.to_string(),
                requested_by: None,
            });
        };
        let Some(&target) = self.index.get(to) else {
            return Err(ResolutionError::UnknownModule {
                module: to.to_string(),
                requested_by: Some(from.clone()),
            });
        };
        self.connect(source, target, kind);
        Ok(())
    }

    fn connect(&mut self, source: NodeIndex, target: NodeIndex, kind: DepEdge) {
        if self.graph.find_edge(source, target).is_none() {
            self.graph.add_edge(source, target, kind);
        }
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.index.contains_key(coordinate)
    }

    pub fn node(&self, coordinate: &Coordinate) -> Option<&GraphNode> {
        self.index.get(coordinate).map(|&idx| &self.graph[idx])
    }

    pub fn module(&self, coordinate: &Coordinate) -> Option<&Module> {
        self.node(coordinate).and_then(|n| n.module.as_ref())
    }

    pub fn is_local(&self, coordinate: &Coordinate) -> bool {
        self.node(coordinate).is_some_and(GraphNode::is_local)
    }

    /// All coordinates in natural order.
    pub fn nodes(&self) -> BTreeSet<Coordinate> {
        self.index.keys().cloned().collect()
    }

    /// Locally declared modules in natural order.
    pub fn local_modules(&self) -> Vec<&Module> {
        self.sorted_indices()
            .into_iter()
            .filter_map(|idx| self.graph[idx].module.as_ref())
            .collect()
    }

    /// Already-published coordinates in natural order.
    pub fn externals(&self) -> Vec<Coordinate> {
        self.sorted_indices()
            .into_iter()
            .filter(|&idx| !self.graph[idx].is_local())
            .map(|idx| self.graph[idx].coordinate.clone())
            .collect()
    }

    /// Direct dependencies, in the order the edges were added.
    pub fn dependencies_of(&self, coordinate: &Coordinate) -> Vec<Coordinate> {
        self.neighbors(coordinate, Direction::Outgoing)
    }

    /// Direct dependents, in the order the edges were added.
    pub fn dependents_of(&self, coordinate: &Coordinate) -> Vec<Coordinate> {
        self.neighbors(coordinate, Direction::Incoming)
    }

    fn neighbors(&self, coordinate: &Coordinate, dir: Direction) -> Vec<Coordinate> {
        let Some(&idx) = self.index.get(coordinate) else {
            return Vec::new();
        };
        self.adjacent(idx, dir)
            .into_iter()
            .map(|(i, _)| self.graph[i].coordinate.clone())
            .collect()
    }

    // petgraph walks a node's edge list newest-first.
    fn adjacent(&self, idx: NodeIndex, dir: Direction) -> Vec<(NodeIndex, DepEdge)> {
        let mut out: Vec<(NodeIndex, DepEdge)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, *e.weight())
            })
            .collect();
        out.reverse();
        out
    }

    fn sorted_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.graph[*a].coordinate.cmp(&self.graph[*b].coordinate));
        indices
    }

    /// Rebuild the graph with every requested edge retargeted to the chosen
    /// version of its module. Project edges keep their target. External nodes
    /// that no longer have a dependent are dropped.
    pub fn collapse(&self, chosen: &BTreeMap<ModuleKey, Version>) -> DependencyGraph {
        let mut out = DependencyGraph::new();
        let sorted = self.sorted_indices();
        for &idx in &sorted {
            if let Some(module) = &self.graph[idx].module {
                out.add_module(module.clone());
            }
        }
        for &idx in &sorted {
            if !self.graph[idx].is_local() {
                continue;
            }
            let Some(&source) = out.index.get(&self.graph[idx].coordinate) else {
                continue;
            };
            for (target, kind) in self.adjacent(idx, Direction::Outgoing) {
                let original = &self.graph[target].coordinate;
                let coordinate = match (kind, chosen.get(&original.key())) {
                    (DepEdge::Requested, Some(version)) => original.key().at(version.clone()),
                    _ => original.clone(),
                };
                let target = out.add_external(coordinate);
                out.connect(source, target, kind);
            }
        }
        out
    }

    /// Find a dependency cycle, if any.
    ///
    /// Nodes are visited in natural order and dependencies in insertion order,
    /// so the reported cycle is deterministic. It starts at the node the back
    /// edge points to and lists every node once.
    pub fn find_cycle(&self) -> Option<Vec<Coordinate>> {
        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        for idx in self.sorted_indices() {
            if marks.contains_key(&idx) {
                continue;
            }
            if let Some(cycle) = self.visit(idx, &mut marks, &mut stack) {
                return Some(
                    cycle
                        .into_iter()
                        .map(|i| self.graph[i].coordinate.clone())
                        .collect(),
                );
            }
        }
        None
    }

    fn visit(
        &self,
        idx: NodeIndex,
        marks: &mut HashMap<NodeIndex, Mark>,
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        marks.insert(idx, Mark::InProgress);
        stack.push(idx);
        for (next, _) in self.adjacent(idx, Direction::Outgoing) {
            match marks.get(&next) {
                Some(Mark::InProgress) => {
                    let start = stack.iter().position(|&i| i == next).unwrap_or(0);
                    return Some(stack[start..].to_vec());
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(cycle) = self.visit(next, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
        }
        stack.pop();
        marks.insert(idx, Mark::Done);
        None
    }

    /// Local modules nothing else depends on, in natural order.
    pub fn roots(&self) -> Vec<Coordinate> {
        self.sorted_indices()
            .into_iter()
            .filter(|&idx| {
                self.graph[idx].is_local()
                    && self
                        .graph
                        .edges_directed(idx, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .map(|idx| self.graph[idx].coordinate.clone())
            .collect()
    }

    fn label(&self, idx: NodeIndex) -> String {
        let node = &self.graph[idx];
        if node.is_local() {
            node.coordinate.to_string()
        } else {
            format!("{} (external)", node.coordinate)
        }
    }

    /// Print the dependency tree of every root module.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        for (n, root) in self.roots().iter().enumerate() {
            let Some(&idx) = self.index.get(root) else {
                continue;
            };
            if n > 0 {
                output.push('\n');
            }
            output.push_str(&format!("{}\n", self.label(idx)));

            let mut visited = HashSet::new();
            visited.insert(idx);
            let deps = self.adjacent(idx, Direction::Outgoing);
            let count = deps.len();
            for (i, (child, _)) in deps.iter().enumerate() {
                let is_last = i == count - 1;
                self.print_subtree(&mut output, *child, "", is_last, 1, max_depth, &mut visited);
            }
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.label(idx)));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.adjacent(idx, Direction::Outgoing);
        let count = deps.len();
        for (i, (child, _)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Resolve a user-provided key to a node index.
    ///
    /// Accepts `group:name:version`, `group:name`, or a bare `name`; the last
    /// two pick the highest matching version.
    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(coordinate) = Coordinate::parse(key) {
            return self.index.get(&coordinate).copied();
        }
        let module_key = ModuleKey::parse(key);
        self.sorted_indices().into_iter().rev().find(|&idx| {
            let c = &self.graph[idx].coordinate;
            match &module_key {
                Some(k) => c.group == k.group && c.name == k.name,
                None => c.name == key,
            }
        })
    }

    /// Find the chain of dependencies from a root module to `target_key`.
    pub fn find_path(&self, target_key: &str) -> Option<Vec<&Coordinate>> {
        let target = self.resolve_key(target_key)?;
        for root in self.roots() {
            let Some(&start) = self.index.get(&root) else {
                continue;
            };
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(start, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &self.graph[idx].coordinate).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (next, _) in self.adjacent(current, Direction::Outgoing) {
            if self.dfs_path(next, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Print everything that (transitively) depends on `target_key`.
    pub fn print_inverted_tree(&self, target_key: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_key(target_key) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.label(idx)));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.adjacent(idx, Direction::Incoming);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(&mut output, *dep_idx, "", is_last, &mut visited);
        }

        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.label(idx)));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.adjacent(idx, Direction::Incoming);
        let count = dependents.len();
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_inverted_subtree(output, *dep_idx, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A graph that passed resolution: every edge targets exactly one version of
/// its module and there are no cycles. Only [`crate::resolve`] creates one.
#[derive(Debug, Clone)]
pub struct ResolvedGraph(DependencyGraph);

impl ResolvedGraph {
    pub(crate) fn new(graph: DependencyGraph) -> Self {
        Self(graph)
    }
}

impl Deref for ResolvedGraph {
    type Target = DependencyGraph;

    fn deref(&self) -> &DependencyGraph {
        &self.0
    }
}
