//! Topology query surface: adjacency lookups and island partitioning.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::network::model::NetworkModel;
use crate::sim::component::{ComponentRef, ComponentType};

/// Undirected bus/branch topology with per-bus generator membership.
///
/// Node weights are bus ids, edge weights are branch ids. The graph is built
/// once from the model tables; live component status is supplied per query as
/// a predicate, so no rebuild is needed when statuses change.
pub struct NetworkGraph {
    graph: UnGraph<usize, usize>,
    nodes: Vec<NodeIndex>,
    gens_at_bus: Vec<Vec<usize>>,
}

/// Induced subgraph reachable through conducting branches.
///
/// Member id vectors are sorted ascending, so membership checks are binary
/// searches.
#[derive(Debug, Clone)]
pub struct Island {
    pub bus_ids: Vec<usize>,
    pub branch_ids: Vec<usize>,
    pub gen_ids: Vec<usize>,
}

impl Island {
    /// Whether the island contains the given component.
    pub fn contains(&self, comp: ComponentRef) -> bool {
        let ids = match comp.ctype {
            ComponentType::Branch => &self.branch_ids,
            ComponentType::Bus => &self.bus_ids,
            ComponentType::Generator => &self.gen_ids,
        };
        ids.binary_search(&comp.id).is_ok()
    }
}

impl NetworkGraph {
    /// Builds the adjacency structure from the model tables.
    pub fn from_model(model: &NetworkModel) -> Self {
        let mut graph = UnGraph::<usize, usize>::new_undirected();
        let nodes: Vec<NodeIndex> = (1..=model.bus_count()).map(|id| graph.add_node(id)).collect();
        for br in model.branches() {
            graph.add_edge(nodes[br.from_bus - 1], nodes[br.to_bus - 1], br.id);
        }
        let mut gens_at_bus = vec![Vec::new(); model.bus_count()];
        for g in model.gens() {
            gens_at_bus[g.bus - 1].push(g.id);
        }
        Self {
            graph,
            nodes,
            gens_at_bus,
        }
    }

    pub fn bus_count(&self) -> usize {
        self.nodes.len()
    }

    /// Generator ids hosted at a bus.
    pub fn gens_at(&self, bus_id: usize) -> &[usize] {
        &self.gens_at_bus[bus_id - 1]
    }

    /// `(branch_id, other_bus_id)` pairs for every branch incident to a bus,
    /// regardless of branch status.
    pub fn incident(&self, bus_id: usize) -> Vec<(usize, usize)> {
        let node = self.nodes[bus_id - 1];
        self.graph
            .edges(node)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                (*e.weight(), self.graph[other])
            })
            .collect()
    }

    /// Partitions the buses into islands, traversing only branches for which
    /// `conducting(branch_id)` is true.
    ///
    /// Worklist BFS with an explicit visited set. Every bus lands in exactly
    /// one island; an isolated bus forms a singleton island.
    pub fn islands(&self, conducting: impl Fn(usize) -> bool) -> Vec<Island> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut islands = Vec::new();

        for &start in &self.nodes {
            if visited.contains(&start) {
                continue;
            }
            let mut queue = VecDeque::new();
            queue.push_back(start);
            let mut bus_ids = Vec::new();
            let mut branch_ids: HashSet<usize> = HashSet::new();

            while let Some(node) = queue.pop_front() {
                if !visited.insert(node) {
                    continue;
                }
                bus_ids.push(self.graph[node]);
                for e in self.graph.edges(node) {
                    let branch_id = *e.weight();
                    if !conducting(branch_id) {
                        continue;
                    }
                    branch_ids.insert(branch_id);
                    let other = if e.source() == node { e.target() } else { e.source() };
                    if !visited.contains(&other) {
                        queue.push_back(other);
                    }
                }
            }

            bus_ids.sort_unstable();
            let mut branch_ids: Vec<usize> = branch_ids.into_iter().collect();
            branch_ids.sort_unstable();
            let mut gen_ids: Vec<usize> = bus_ids
                .iter()
                .flat_map(|&b| self.gens_at(b).iter().copied())
                .collect();
            gen_ids.sort_unstable();

            islands.push(Island {
                bus_ids,
                branch_ids,
                gen_ids,
            });
        }

        islands
    }
}
