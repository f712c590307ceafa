//! Job graph builder using petgraph.
//!
//! Edges point from a job to the jobs it needs. Ordering is Kahn's
//! algorithm with a min-heap over job names, so equal-rank jobs always come
//! out alphabetically and the order is identical run to run regardless of
//! insertion order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::{GraphError, Result};

/// Dependency graph over job declaration names.
#[derive(Debug, Clone, Default)]
pub struct JobGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl JobGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job node. Adding the same name twice is a no-op and returns
    /// the existing index.
    pub fn add_job(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(name) {
            return node;
        }
        let node = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), node);
        debug!("added job node '{}'", name);
        node
    }

    /// Record that `job` needs `dependency`. Both jobs must already be in
    /// the graph; duplicate edges collapse to one.
    pub fn add_dependency(&mut self, job: &str, dependency: &str) -> Result<()> {
        let Some(&from) = self.nodes.get(job) else {
            return Err(GraphError::UnknownJob {
                name: job.to_string(),
            });
        };
        let Some(&to) = self.nodes.get(dependency) else {
            return Err(GraphError::UnknownDependency {
                job: job.to_string(),
                dependency: dependency.to_string(),
            });
        };
        self.graph.update_edge(from, to, ());
        Ok(())
    }

    /// Whether a job with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of jobs in the graph.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether any dependency cycle exists.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Jobs a job directly needs, sorted by name.
    pub fn direct_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let node = self.index_of(name)?;
        Ok(self.sorted_names(self.graph.neighbors_directed(node, Direction::Outgoing)))
    }

    /// Jobs that directly need a job, sorted by name.
    pub fn direct_dependents(&self, name: &str) -> Result<Vec<String>> {
        let node = self.index_of(name)?;
        Ok(self.sorted_names(self.graph.neighbors_directed(node, Direction::Incoming)))
    }

    /// Everything a job needs, directly or through other jobs, sorted by
    /// name.
    pub fn transitive_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let node = self.index_of(name)?;
        Ok(self.reachable(node, Direction::Outgoing))
    }

    /// Everything that needs a job, directly or through other jobs, sorted
    /// by name.
    pub fn transitive_dependents(&self, name: &str) -> Result<Vec<String>> {
        let node = self.index_of(name)?;
        Ok(self.reachable(node, Direction::Incoming))
    }

    /// Total execution order: every dependency before its dependents, ties
    /// broken alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] listing every detected cycle when no
    /// order exists.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut pending: HashMap<NodeIndex, usize> = HashMap::new();
        let mut ready: BinaryHeap<Reverse<(String, NodeIndex)>> = BinaryHeap::new();

        for node in self.graph.node_indices() {
            let wanted = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .count();
            if wanted == 0 {
                ready.push(Reverse((self.graph[node].clone(), node)));
            } else {
                pending.insert(node, wanted);
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((name, node))) = ready.pop() {
            order.push(name);
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if let Some(remaining) = pending.get_mut(&dependent) {
                    *remaining -= 1;
                    if *remaining == 0 {
                        pending.remove(&dependent);
                        ready.push(Reverse((self.graph[dependent].clone(), dependent)));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(GraphError::Cycle {
                cycles: self.cycles(),
            });
        }
        Ok(order)
    }

    /// Enumerate dependency cycles by name, each in traversal order.
    ///
    /// Roots and neighbors are visited alphabetically, so the same graph
    /// always reports the same cycles in the same order.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        const WHITE: u8 = 0;
        const GREY: u8 = 1;
        const BLACK: u8 = 2;

        let mut marks: HashMap<NodeIndex, u8> =
            self.graph.node_indices().map(|node| (node, WHITE)).collect();
        let mut found = Vec::new();

        let mut roots: Vec<NodeIndex> = self.graph.node_indices().collect();
        roots.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for root in roots {
            if marks.get(&root) != Some(&WHITE) {
                continue;
            }
            marks.insert(root, GREY);
            let mut path = vec![root];
            let mut stack = vec![(root, self.sorted_dep_indices(root), 0_usize)];

            while let Some((node, neighbors, cursor)) = stack.pop() {
                if cursor < neighbors.len() {
                    let next = neighbors[cursor];
                    stack.push((node, neighbors, cursor + 1));
                    match marks.get(&next) {
                        Some(&WHITE) => {
                            marks.insert(next, GREY);
                            path.push(next);
                            let deps = self.sorted_dep_indices(next);
                            stack.push((next, deps, 0));
                        }
                        Some(&GREY) => {
                            // Back edge into the active path closes a cycle.
                            let start = path.iter().position(|&p| p == next).unwrap_or(0);
                            found.push(
                                path[start..]
                                    .iter()
                                    .map(|&p| self.graph[p].clone())
                                    .collect(),
                            );
                        }
                        _ => {}
                    }
                } else {
                    marks.insert(node, BLACK);
                    path.pop();
                }
            }
        }

        found
    }

    fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownJob {
                name: name.to_string(),
            })
    }

    fn sorted_dep_indices(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        deps.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        deps
    }

    fn sorted_names(&self, nodes: impl Iterator<Item = NodeIndex>) -> Vec<String> {
        let mut names: Vec<String> = nodes.map(|node| self.graph[node].clone()).collect();
        names.sort_unstable();
        names
    }

    fn reachable(&self, start: NodeIndex, direction: Direction) -> Vec<String> {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut frontier = vec![start];
        while let Some(node) = frontier.pop() {
            for next in self.graph.neighbors_directed(node, direction) {
                if seen.insert(next) {
                    frontier.push(next);
                }
            }
        }
        self.sorted_names(seen.into_iter())
    }
}
