//! `AdjacencyView`: the undirected, chunk-agnostic graph shape the
//! partitioner's community-detection strategies operate over (spec §9:
//! "consumed through a single partitioning interface"). Built once per
//! connected component so every strategy works on plain node ids and
//! adjacency lists rather than the full bidirected `Node`/`Endpoint`
//! model.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::model::{Graph, NodeId};

#[derive(Clone, Debug, Default)]
pub struct AdjacencyView {
    pub nodes: Vec<NodeId>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl AdjacencyView {
    pub fn from_graph(graph: &Graph) -> Self {
        Self::induced_from(graph, graph.nodes.keys().cloned())
    }

    /// The subgraph induced by `subset`: neighbors outside the subset
    /// are dropped, matching "undirected graph view" over just those
    /// nodes (spec §4.2's per-component and per-split views).
    pub fn induced_from(graph: &Graph, subset: impl IntoIterator<Item = NodeId>) -> Self {
        let nodes: Vec<NodeId> = subset.into_iter().collect();
        let present: std::collections::HashSet<&NodeId> = nodes.iter().collect();
        let mut adjacency: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
        for id in &nodes {
            let mut set = BTreeSet::new();
            if let Some(node) = graph.get(id) {
                for other in node.neighbor_ids() {
                    if present.contains(&other) && &other != id {
                        set.insert(other);
                    }
                }
            }
            adjacency.insert(id.clone(), set);
        }
        AdjacencyView { nodes, adjacency }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn neighbors(&self, id: &NodeId) -> &BTreeSet<NodeId> {
        static EMPTY: BTreeSet<NodeId> = BTreeSet::new();
        self.adjacency.get(id).unwrap_or(&EMPTY)
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.neighbors(id).len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|s| s.len()).sum::<usize>() / 2
    }

    /// Connected components of this view, via plain BFS. Every group a
    /// strategy returns is refined through this so bisections that
    /// don't preserve connectivity still end up one chunk per component
    /// (spec §4.2 step 2's parenthetical).
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: std::collections::HashSet<NodeId> = std::collections::HashSet::new();
        let mut components = Vec::new();
        for start in &self.nodes {
            if seen.contains(start) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(start.clone());
            seen.insert(start.clone());
            while let Some(cur) = queue.pop_front() {
                component.push(cur.clone());
                for n in self.neighbors(&cur) {
                    if seen.insert(n.clone()) {
                        queue.push_back(n.clone());
                    }
                }
            }
            components.push(component);
        }
        components
    }
}

/// The single capability the driver needs from a community-detection
/// algorithm: given an undirected view, return disjoint node-id groups
/// covering every node in the view (spec §9).
pub trait CommunityStrategy {
    fn groups(&self, view: &AdjacencyView) -> Vec<Vec<NodeId>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_graph() -> Graph {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\n\
                   L\tA\t+\tB\t+\t1M\nL\tB\t+\tC\t+\t1M\n";
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, gfa.as_bytes()).unwrap();
        crate::gfa::reader::read_graph(f.path()).unwrap()
    }

    #[test]
    fn single_component_for_connected_graph() {
        let graph = linear_graph();
        let view = AdjacencyView::from_graph(&graph);
        assert_eq!(view.connected_components().len(), 1);
        assert_eq!(view.edge_count(), 2);
    }

    #[test]
    fn induced_view_drops_external_neighbors() {
        let graph = linear_graph();
        let subset = vec![NodeId::from("A"), NodeId::from("B")];
        let view = AdjacencyView::induced_from(&graph, subset);
        assert_eq!(view.degree(&NodeId::from("B")), 1);
    }
}
