//! Greedy modularity agglomeration, grounded on
//! `greedy_modularity_communities_partitioning.py`'s use of
//! `nx.community.greedy_modularity_communities`: start with every node
//! in its own community and repeatedly merge the pair of adjacent
//! communities whose merge increases modularity the most, stopping
//! when no merge helps.

use std::collections::{HashMap, HashSet};

use crate::model::NodeId;

use super::strategy::{AdjacencyView, CommunityStrategy};

pub struct GreedyModularity;

impl GreedyModularity {
    pub fn new() -> Self {
        GreedyModularity
    }
}

impl Default for GreedyModularity {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityStrategy for GreedyModularity {
    fn name(&self) -> &'static str {
        "gm"
    }

    fn groups(&self, view: &AdjacencyView) -> Vec<Vec<NodeId>> {
        if view.is_empty() {
            return Vec::new();
        }
        let m = view.edge_count() as f64;
        if m == 0.0 {
            return view.nodes.iter().map(|n| vec![n.clone()]).collect();
        }

        // community id -> member set; start one community per node.
        let mut communities: HashMap<u32, HashSet<NodeId>> = HashMap::new();
        let mut membership: HashMap<NodeId, u32> = HashMap::new();
        for (i, id) in view.nodes.iter().enumerate() {
            let cid = i as u32;
            communities.insert(cid, HashSet::from([id.clone()]));
            membership.insert(id.clone(), cid);
        }
        let degree = |id: &NodeId| view.degree(id) as f64;

        loop {
            // Edge counts between distinct communities.
            let mut inter: HashMap<(u32, u32), f64> = HashMap::new();
            let mut community_degree: HashMap<u32, f64> = HashMap::new();
            for id in &view.nodes {
                let cid = membership[id];
                *community_degree.entry(cid).or_insert(0.0) += degree(id);
                for n in view.neighbors(id) {
                    let ncid = membership[n];
                    if ncid != cid {
                        let key = if cid < ncid { (cid, ncid) } else { (ncid, cid) };
                        *inter.entry(key).or_insert(0.0) += 0.5;
                    }
                }
            }

            let mut best: Option<((u32, u32), f64)> = None;
            for (&(i, j), &e_ij) in &inter {
                let a_i = community_degree.get(&i).copied().unwrap_or(0.0);
                let a_j = community_degree.get(&j).copied().unwrap_or(0.0);
                let delta_q = (e_ij / m) - (a_i * a_j) / (2.0 * m * m);
                if best.map(|(_, b)| delta_q > b).unwrap_or(true) {
                    best = Some(((i, j), delta_q));
                }
            }

            match best {
                Some(((i, j), delta_q)) if delta_q > 0.0 => {
                    let moved: Vec<NodeId> = communities.remove(&j).unwrap_or_default().into_iter().collect();
                    for id in &moved {
                        membership.insert(id.clone(), i);
                    }
                    if let Some(bucket) = communities.get_mut(&i) {
                        bucket.extend(moved);
                    }
                }
                _ => break,
            }
        }

        let mut groups: Vec<Vec<NodeId>> = communities
            .into_values()
            .map(|set| {
                let mut v: Vec<NodeId> = set.into_iter().collect();
                v.sort();
                v
            })
            .collect();
        groups.sort_by(|a, b| a.first().cmp(&b.first()));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::reader::read_graph;

    #[test]
    fn merges_two_dense_clusters_separately() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\nS\tD\tACGT\n\
                   L\tA\t+\tB\t+\t1M\nL\tC\t+\tD\t+\t1M\n";
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, gfa.as_bytes()).unwrap();
        let graph = read_graph(f.path()).unwrap();
        let view = AdjacencyView::from_graph(&graph);
        let groups = GreedyModularity::new().groups(&view);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, 4);
        assert!(groups.iter().all(|g| g.len() <= 2));
    }

    #[test]
    fn isolated_nodes_stay_singletons() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\n";
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, gfa.as_bytes()).unwrap();
        let graph = read_graph(f.path()).unwrap();
        let view = AdjacencyView::from_graph(&graph);
        let groups = GreedyModularity::new().groups(&view);
        assert_eq!(groups.len(), 2);
    }
}
