//! Activation graph: which accepted value relies on which provider.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::queue::QueueSnapshot;

/// How a dependent relies on its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The provider must be accepted before the dependent.
    Require,
    /// The provider must be accepted, in any order.
    Need,
}

/// Edge label: the key that links a dependent to its provider.
#[derive(Debug, Clone)]
pub struct ActivationEdge<K> {
    pub key: K,
    pub kind: EdgeKind,
}

impl<K: fmt::Display> fmt::Display for ActivationEdge<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EdgeKind::Require => write!(f, "{}", self.key),
            EdgeKind::Need => write!(f, "needs {}", self.key),
        }
    }
}

/// Accepted values linked from each dependent to the provider that satisfies
/// each of its keys.
pub struct ActivationGraph<K, V> {
    graph: DiGraph<V, ActivationEdge<K>>,
    index: HashMap<V, NodeIndex>,
}

impl<K, V> ActivationGraph<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph of accepted values in a snapshot.
    ///
    /// Each key links to the first accepted provider in provider order.
    /// Self-provided keys produce no edge.
    pub fn from_snapshot(snapshot: &QueueSnapshot<K, V>) -> Self {
        let mut graph = Self::new();
        let accepted: Vec<_> = snapshot.entries.iter().filter(|e| e.accepted).collect();
        for entry in &accepted {
            graph.add_node(entry.value.clone());
        }

        for entry in &accepted {
            let from = graph.index[&entry.value];
            let descriptor = &entry.descriptor;
            let links = descriptor
                .requires
                .iter()
                .map(|k| (k, EdgeKind::Require))
                .chain(
                    descriptor
                        .needs
                        .iter()
                        .filter(|k| !descriptor.requires.contains(*k))
                        .map(|k| (k, EdgeKind::Need)),
                );
            for (key, kind) in links {
                let provider = snapshot
                    .providers
                    .get(key)
                    .and_then(|set| set.iter().find_map(|p| graph.index.get(p).copied()));
                if let Some(to) = provider {
                    if to != from {
                        graph.graph.add_edge(
                            from,
                            to,
                            ActivationEdge {
                                key: key.clone(),
                                kind,
                            },
                        );
                    }
                }
            }
        }
        graph
    }

    /// Add or retrieve a node.
    fn add_node(&mut self, value: V) -> NodeIndex {
        if let Some(&idx) = self.index.get(&value) {
            return idx;
        }
        let idx = self.graph.add_node(value.clone());
        self.index.insert(value, idx);
        idx
    }

    pub fn contains(&self, value: &V) -> bool {
        self.index.contains_key(value)
    }

    /// Providers `value` relies on.
    pub fn dependencies_of(&self, value: &V) -> Vec<(&V, &ActivationEdge<K>)> {
        self.neighbors(value, Direction::Outgoing)
    }

    /// Values relying on `value`.
    pub fn dependents_of(&self, value: &V) -> Vec<(&V, &ActivationEdge<K>)> {
        self.neighbors(value, Direction::Incoming)
    }

    fn neighbors(&self, value: &V, direction: Direction) -> Vec<(&V, &ActivationEdge<K>)> {
        let Some(&idx) = self.index.get(value) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, e.weight())
            })
            .collect();
        // petgraph yields edges newest first.
        out.reverse();
        out.into_iter()
            .map(|(other, edge)| (&self.graph[other], edge))
            .collect()
    }

    /// Accepted values nothing else relies on, in registration order.
    pub fn roots(&self) -> Vec<&V> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> ActivationGraph<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Eq + Hash + Clone + fmt::Display,
{
    /// Render the graph as a tree from each root down to its providers.
    ///
    /// Values only reachable through a cycle are printed as extra roots.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let mut seen = HashSet::new();

        let roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        for root in roots {
            self.print_root(&mut output, root, max_depth, &mut seen);
        }
        for idx in self.graph.node_indices() {
            if !seen.contains(&idx) {
                self.print_root(&mut output, idx, max_depth, &mut seen);
            }
        }
        output
    }

    fn print_root(
        &self,
        output: &mut String,
        root: NodeIndex,
        max_depth: Option<usize>,
        seen: &mut HashSet<NodeIndex>,
    ) {
        output.push_str(&format!("{}\n", self.graph[root]));
        seen.insert(root);
        let mut path = HashSet::new();
        path.insert(root);
        self.print_children(output, root, "", 1, max_depth, &mut path, seen);
    }

    #[allow(clippy::too_many_arguments)]
    fn print_children(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        depth: usize,
        max_depth: Option<usize>,
        path: &mut HashSet<NodeIndex>,
        seen: &mut HashSet<NodeIndex>,
    ) {
        if let Some(max) = max_depth {
            if depth > max {
                return;
            }
        }

        let mut children: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        children.reverse();

        let count = children.len();
        for (i, (child, edge)) in children.into_iter().enumerate() {
            let is_last = i == count - 1;
            let connector = if is_last { "└── " } else { "├── " };
            output.push_str(&format!(
                "{prefix}{connector}{} ({edge})\n",
                self.graph[child]
            ));
            seen.insert(child);

            if !path.insert(child) {
                continue;
            }
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            self.print_children(output, child, &child_prefix, depth + 1, max_depth, path, seen);
            path.remove(&child);
        }
    }
}

impl<K, V> Default for ActivationGraph<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
