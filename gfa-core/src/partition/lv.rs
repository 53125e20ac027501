//! One level of Louvain-style local-move label propagation, grounded on
//! `louvian_partitioning.py`: each node considers moving into the
//! community of one of its neighbors and takes the move with the best
//! modularity gain, staying put unless some neighbor community strictly
//! beats that, repeated until a full pass makes no move. This is a
//! single level (no recursive community aggregation) since the driver
//! only needs a flat list of disjoint node groups.

use std::collections::HashMap;

use crate::model::NodeId;
use crate::rng::DeterministicRng;

use super::strategy::{AdjacencyView, CommunityStrategy};

/// `nx.community.louvain_communities` itself takes a `max_level`; a
/// local-move phase that still keeps moving nodes after this many full
/// passes is cycling rather than converging, so it is cut off here.
const MAX_PASSES: u32 = 100;

pub struct Louvain {
    pub seed: u64,
}

impl Louvain {
    pub fn new(seed: u64) -> Self {
        Louvain { seed }
    }
}

impl CommunityStrategy for Louvain {
    fn name(&self) -> &'static str {
        "lv"
    }

    fn groups(&self, view: &AdjacencyView) -> Vec<Vec<NodeId>> {
        if view.is_empty() {
            return Vec::new();
        }
        let two_m = (2 * view.edge_count().max(1)) as f64;

        let mut membership: HashMap<NodeId, u32> = view
            .nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();
        let mut community_degree: HashMap<u32, f64> = view
            .nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (i as u32, view.degree(id) as f64))
            .collect();

        let mut order = view.nodes.clone();
        let mut rng = DeterministicRng::new(self.seed);

        for _ in 0..MAX_PASSES {
            rng.shuffle(&mut order);
            let mut moved_any = false;

            for id in &order {
                let own_cid = membership[id];
                let degree = view.degree(id) as f64;

                let mut weight_to: HashMap<u32, f64> = HashMap::new();
                for n in view.neighbors(id) {
                    *weight_to.entry(membership[n]).or_insert(0.0) += 1.0;
                }
                if weight_to.is_empty() {
                    continue;
                }

                // Remove self from its current community's degree tally
                // for the duration of the gain comparison.
                if let Some(d) = community_degree.get_mut(&own_cid) {
                    *d -= degree;
                }

                // Seed with the stay option so a neighbor community only
                // wins by strictly beating it — otherwise the first
                // neighbor community considered always wins regardless
                // of sign, since nothing was compared against staying.
                let own_k_in = weight_to.get(&own_cid).copied().unwrap_or(0.0);
                let own_sigma_tot = community_degree.get(&own_cid).copied().unwrap_or(0.0);
                let mut best_cid = own_cid;
                let mut best_gain = own_k_in - (own_sigma_tot * degree) / two_m;

                for (&cid, &k_in) in &weight_to {
                    if cid == own_cid {
                        continue;
                    }
                    let sigma_tot = community_degree.get(&cid).copied().unwrap_or(0.0);
                    let gain = k_in - (sigma_tot * degree) / two_m;
                    let better = gain > best_gain || (gain == best_gain && best_cid != own_cid && cid < best_cid);
                    if better {
                        best_gain = gain;
                        best_cid = cid;
                    }
                }

                *community_degree.entry(best_cid).or_insert(0.0) += degree;
                if best_cid != own_cid {
                    membership.insert(id.clone(), best_cid);
                    moved_any = true;
                }
            }

            if !moved_any {
                break;
            }
        }

        let mut by_community: HashMap<u32, Vec<NodeId>> = HashMap::new();
        for id in &view.nodes {
            by_community.entry(membership[id]).or_default().push(id.clone());
        }
        let mut groups: Vec<Vec<NodeId>> = by_community.into_values().collect();
        for g in &mut groups {
            g.sort();
        }
        groups.sort_by(|a, b| a.first().cmp(&b.first()));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::reader::read_graph;

    #[test]
    fn groups_cover_every_node_exactly_once() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\nS\tD\tACGT\nS\tE\tACGT\n\
                   L\tA\t+\tB\t+\t1M\nL\tB\t+\tC\t+\t1M\nL\tD\t+\tE\t+\t1M\n";
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, gfa.as_bytes()).unwrap();
        let graph = read_graph(f.path()).unwrap();
        let view = AdjacencyView::from_graph(&graph);
        let groups = Louvain::new(3).groups(&view);
        let mut all: Vec<NodeId> = groups.into_iter().flatten().collect();
        all.sort();
        assert_eq!(
            all,
            vec![
                NodeId::from("A"),
                NodeId::from("B"),
                NodeId::from("C"),
                NodeId::from("D"),
                NodeId::from("E"),
            ]
        );
    }
}
