//! Superbubble detection (spec §4.6), grounded directly on the
//! original `extgfa/find_bubbles.py`'s `find_sb_alg`. That original
//! pops an arbitrary element off its frontier set on each step; here
//! the frontier is a `BTreeSet` so the smallest `(NodeId, Side)` pair
//! is always chosen next instead, which makes a found bubble's
//! `inside` order reproducible without changing which bubble (if any)
//! is found.

use std::collections::{BTreeSet, HashSet};

use super::ChildrenSource;
use crate::error::Result;
use crate::model::{NodeId, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleFilter {
    Any,
    SimpleOnly,
    SuperOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bubble {
    pub source: NodeId,
    pub sink: NodeId,
    pub inside: Vec<NodeId>,
}

impl Bubble {
    pub fn is_simple(&self) -> bool {
        self.inside.len() == 2
    }

    pub fn is_super(&self) -> bool {
        self.inside.len() > 2
    }
}

/// Walks outward from `(source, direction)`, tracking every path still
/// open (`seen`) and every node already folded in (`visited`), until
/// all open paths converge on one node — that node is the sink.
/// Returns `Ok(None)` on a tip (a node with no children on the side
/// being explored), on a cycle that leads back through `source`, or —
/// under `BubbleFilter::SimpleOnly`/`SuperOnly` — on a convergence that
/// doesn't match the requested shape.
pub fn find_superbubble<C: ChildrenSource>(
    graph: &mut C,
    source: &NodeId,
    direction: Side,
    filter: BubbleFilter,
) -> Result<Option<Bubble>> {
    let mut seen: HashSet<(NodeId, Side)> = HashSet::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut inside: Vec<NodeId> = Vec::new();

    seen.insert((source.clone(), direction));
    let mut frontier: BTreeSet<(NodeId, Side)> = BTreeSet::new();
    frontier.insert((source.clone(), direction));

    while let Some((node, dir)) = frontier.iter().next().cloned() {
        frontier.remove(&(node.clone(), dir));
        visited.insert(node.clone());
        inside.push(node.clone());
        seen.remove(&(node.clone(), dir));

        let children = graph.children_of(&node, dir)?;
        if children.is_empty() {
            return Ok(None);
        }

        let mut looped_to_source = false;
        for (u_id, u_side) in &children {
            if u_id == source {
                looped_to_source = true;
                break;
            }

            // `u_side` is the side of `u` this edge entered on; the
            // bubble continues out of `u`'s opposite side, and `u`'s
            // siblings on *this* side are the paths that must all have
            // converged before `u` itself can join the frontier.
            let u_child_direction = u_side.opposite();
            let u_parents: Vec<NodeId> = graph
                .children_of(u_id, *u_side)?
                .into_iter()
                .map(|(id, _)| id)
                .collect();

            seen.insert((u_id.clone(), u_child_direction));
            if u_parents.iter().all(|p| visited.contains(p)) {
                frontier.insert((u_id.clone(), u_child_direction));
            }
        }

        if looped_to_source {
            return Ok(None);
        }

        if frontier.len() == 1 && seen.len() == 1 {
            let sink = match frontier.iter().next() {
                Some((id, _)) => id.clone(),
                None => return Ok(None),
            };
            if inside.len() == 1 {
                // only `source` itself was ever folded in: an empty
                // bubble, which a compacted graph shouldn't produce.
                return Ok(None);
            }
            inside.retain(|id| id != source);
            let bubble = Bubble {
                source: source.clone(),
                sink,
                inside,
            };
            let keep = match filter {
                BubbleFilter::Any => true,
                BubbleFilter::SimpleOnly => bubble.is_simple(),
                BubbleFilter::SuperOnly => bubble.is_super(),
            };
            return Ok(if keep { Some(bubble) } else { None });
        }
    }

    Ok(None)
}
