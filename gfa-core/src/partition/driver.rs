//! The partitioner driver (spec §4.2): per-connected-component
//! small-shortcut / initial cut / split / merge, against a size band
//! derived from `(upper, lower)`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{GfaError, Result};
use crate::model::{Graph, NodeId};

use super::strategy::{AdjacencyView, CommunityStrategy};

/// Explicit chunk-id allocator, threaded by `&mut` (spec §9: no
/// module-level counter — this replaces the original's `global
/// CHUNK_COUNTER`).
pub struct ChunkIdAllocator {
    next: u32,
}

impl ChunkIdAllocator {
    pub fn new() -> Self {
        ChunkIdAllocator { next: 1 }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for ChunkIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation polled once per outer component loop
/// iteration and once per split/merge round (spec §5).
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

const DEFAULT_MAX_SPLIT_ROUNDS: u32 = 64;

#[derive(Clone, Debug)]
pub struct PartitionConfig {
    pub upper: u32,
    pub lower: u32,
    pub max_split_rounds: u32,
}

impl PartitionConfig {
    pub fn new(upper: u32, lower: u32) -> Result<Self> {
        if upper == 0 || lower == 0 {
            return Err(GfaError::Config {
                detail: "upper and lower must both be positive".to_string(),
            });
        }
        if upper > lower {
            return Err(GfaError::Config {
                detail: format!("upper ({upper}) must be <= lower ({lower})"),
            });
        }
        Ok(PartitionConfig {
            upper,
            lower,
            max_split_rounds: DEFAULT_MAX_SPLIT_ROUNDS,
        })
    }

    pub fn with_max_split_rounds(mut self, rounds: u32) -> Self {
        self.max_split_rounds = rounds;
        self
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
        return Err(GfaError::Cancelled);
    }
    Ok(())
}

/// Runs the given strategy over `C`, then refines every returned group
/// into its own connected components (spec §4.2 step 2's parenthetical
/// — harmless even for strategies that already preserve connectivity).
fn cut_and_refine(graph: &Graph, members: &[NodeId], strategy: &dyn CommunityStrategy) -> Vec<Vec<NodeId>> {
    let view = AdjacencyView::induced_from(graph, members.iter().cloned());
    let groups = strategy.groups(&view);
    let mut refined = Vec::new();
    for g in groups {
        if g.is_empty() {
            continue;
        }
        let gview = AdjacencyView::induced_from(graph, g.iter().cloned());
        refined.extend(gview.connected_components());
    }
    refined
}

fn split_oversize(
    graph: &Graph,
    component: Vec<NodeId>,
    hi: f64,
    strategy: &dyn CommunityStrategy,
    max_split_rounds: u32,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Vec<NodeId>>> {
    let mut worklist: VecDeque<(Vec<NodeId>, u32)> = VecDeque::new();
    for g in cut_and_refine(graph, &component, strategy) {
        worklist.push_back((g, 0));
    }

    let mut finished = Vec::new();
    while let Some((chunk, rounds)) = worklist.pop_front() {
        check_cancelled(cancel)?;
        if (chunk.len() as f64) <= hi {
            finished.push(chunk);
            continue;
        }
        if rounds >= max_split_rounds {
            return Err(GfaError::PartitionerStall {
                chunk_size: chunk.len(),
                rounds,
            });
        }
        info!(size = chunk.len(), round = rounds, "splitting oversize chunk");
        for g in cut_and_refine(graph, &chunk, strategy) {
            worklist.push_back((g, rounds + 1));
        }
    }
    Ok(finished)
}

/// Merges undersize chunks into their highest-tallied external
/// neighbor chunk (spec §4.2 step 4). Operates on the full set of
/// groups produced by the per-component split passes, since a merge
/// target may belong to a different connected component's chunk only
/// in the degenerate case of an already-isolated undersize group.
fn merge_undersize(graph: &Graph, groups: Vec<Vec<NodeId>>, lo: f64) -> Vec<Vec<NodeId>> {
    let mut alive: HashMap<u32, Vec<NodeId>> = groups.into_iter().enumerate().map(|(i, g)| (i as u32, g)).collect();
    let mut membership: HashMap<NodeId, u32> = HashMap::new();
    for (&gid, members) in &alive {
        for id in members {
            membership.insert(id.clone(), gid);
        }
    }

    let undersize: Vec<u32> = alive
        .iter()
        .filter(|(_, members)| (members.len() as f64) < lo)
        .map(|(&gid, _)| gid)
        .collect();
    let mut undersize_sorted = undersize;
    undersize_sorted.sort_unstable();

    for gid in undersize_sorted {
        let members = match alive.get(&gid) {
            Some(m) if (m.len() as f64) < lo => m.clone(),
            _ => continue, // already merged away or grown past lo by an earlier merge
        };

        let mut tally: HashMap<u32, usize> = HashMap::new();
        for id in &members {
            if let Some(node) = graph.get(id) {
                for n in node.neighbor_ids() {
                    if let Some(&ncid) = membership.get(&n) {
                        if ncid != gid {
                            *tally.entry(ncid).or_insert(0) += 1;
                        }
                    }
                }
            }
        }

        let target = tally
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(cid, _)| cid);

        match target {
            Some(target_id) => {
                let absorbed = alive.remove(&gid).unwrap_or_default();
                for id in &absorbed {
                    membership.insert(id.clone(), target_id);
                }
                match alive.get_mut(&target_id) {
                    Some(bucket) => bucket.extend(absorbed),
                    None => {
                        // target vanished from under us; keep the nodes as their own
                        // group rather than lose them.
                        alive.insert(gid, absorbed);
                    }
                }
            }
            None => {
                warn!(chunk_size = members.len(), "undersize chunk has no external neighbors, leaving unmerged");
            }
        }
    }

    let mut ids: Vec<u32> = alive.keys().copied().collect();
    ids.sort_unstable();
    ids.into_iter().filter_map(|id| alive.remove(&id)).collect()
}

/// Partitions `graph` into a list of disjoint node-id groups per spec
/// §4.2. The i-th group in the returned vector is later assigned chunk
/// id `i + 1` by the chunked writer.
pub fn partition(
    graph: &Graph,
    strategy: &dyn CommunityStrategy,
    cfg: &PartitionConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Vec<NodeId>>> {
    if graph.is_empty() {
        return Ok(Vec::new());
    }

    let total = graph.len() as f64;
    let hi = total / cfg.upper as f64;
    let lo = total / cfg.lower as f64;

    let full_view = AdjacencyView::from_graph(graph);
    let components = full_view.connected_components();
    info!(components = components.len(), hi, lo, strategy = strategy.name(), "partitioning");

    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    for component in components {
        check_cancelled(cancel)?;
        if (component.len() as f64) < hi {
            groups.push(component);
            continue;
        }
        let split = split_oversize(graph, component, hi, strategy, cfg.max_split_rounds, cancel)?;
        groups.extend(split);
    }

    Ok(merge_undersize(graph, groups, lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::reader::read_graph;
    use crate::partition::kl::KernighanLin;

    fn write_graph(gfa: &str) -> Graph {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, gfa.as_bytes()).unwrap();
        read_graph(f.path()).unwrap()
    }

    #[test]
    fn small_component_gets_a_single_chunk() {
        let graph = write_graph("S\tA\tACGT\nS\tB\tACGT\nL\tA\t+\tB\t+\t1M\n");
        let cfg = PartitionConfig::new(1, 1).unwrap();
        let strategy = KernighanLin::new(1);
        let groups = partition(&graph, &strategy, &cfg, None).unwrap();
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn every_node_ends_up_in_exactly_one_group() {
        let graph = write_graph(
            "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\nS\tD\tACGT\nS\tE\tACGT\nS\tF\tACGT\n\
             L\tA\t+\tB\t+\t1M\nL\tB\t+\tC\t+\t1M\nL\tC\t+\tD\t+\t1M\n\
             L\tD\t+\tE\t+\t1M\nL\tE\t+\tF\t+\t1M\n",
        );
        let cfg = PartitionConfig::new(2, 3).unwrap();
        let strategy = KernighanLin::new(99);
        let groups = partition(&graph, &strategy, &cfg, None).unwrap();
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
                NodeId::from("F"),
            ]
        );
    }

    #[test]
    fn rejects_upper_greater_than_lower() {
        assert!(PartitionConfig::new(5, 2).is_err());
    }

    #[test]
    fn cancellation_is_observed() {
        let graph = write_graph("S\tA\tACGT\nS\tB\tACGT\nL\tA\t+\tB\t+\t1M\n");
        let cfg = PartitionConfig::new(1, 1).unwrap();
        let strategy = KernighanLin::new(1);
        let token = CancellationToken::new();
        token.cancel();
        assert!(partition(&graph, &strategy, &cfg, Some(&token)).is_err());
    }
}
