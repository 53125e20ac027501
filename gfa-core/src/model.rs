//! The bidirected node/edge data model (spec §3).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Opaque, stable node identifier. Unique within a graph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a node an edge attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Start = 0,
    End = 1,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Start => Side::End,
            Side::End => Side::Start,
        }
    }
}

/// One half of an L-record, stored on the incident node it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub other: NodeId,
    pub side: Side,
    pub overlap: u32,
}

/// A GFA tag: `K:T:V` becomes `tags[K] = Tag { type_code: T, value: V }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub type_code: char,
    pub value: String,
}

pub const CHUNK_TAG: &str = "cid";
pub const CHUNK_TAG_TYPE: char = 'i';

/// Chunk id 0 means "unassigned"; only valid before/during partitioning.
pub const UNASSIGNED_CHUNK: u32 = 0;

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    /// Verbatim sequence string, may be empty or the sentinel `*`.
    pub seq: String,
    pub len: usize,
    pub start: BTreeSet<Endpoint>,
    pub end: BTreeSet<Endpoint>,
    pub tags: BTreeMap<String, Tag>,
    pub chunk_id: u32,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            seq: String::new(),
            len: 0,
            start: BTreeSet::new(),
            end: BTreeSet::new(),
            tags: BTreeMap::new(),
            chunk_id: UNASSIGNED_CHUNK,
        }
    }

    /// Ids of all adjacent nodes, undirected, start-side then end-side.
    pub fn neighbor_ids(&self) -> Vec<NodeId> {
        self.start
            .iter()
            .chain(self.end.iter())
            .map(|e| e.other.clone())
            .collect()
    }

    pub fn endpoints(&self, side: Side) -> &BTreeSet<Endpoint> {
        match side {
            Side::Start => &self.start,
            Side::End => &self.end,
        }
    }

    pub fn endpoints_mut(&mut self, side: Side) -> &mut BTreeSet<Endpoint> {
        match side {
            Side::Start => &mut self.start,
            Side::End => &mut self.end,
        }
    }

    /// One GFA S-line, always carrying the `cid` tag.
    pub fn to_gfa_s_line(&self) -> String {
        let seq = if self.seq.is_empty() { "*" } else { &self.seq };
        let mut fields = vec!["S".to_string(), self.id.0.clone(), seq.to_string()];
        for (name, tag) in &self.tags {
            if name == CHUNK_TAG {
                continue; // cid is always re-derived and appended last
            }
            fields.push(format!("{name}:{}:{}", tag.type_code, tag.value));
        }
        fields.push(format!("{CHUNK_TAG}:{CHUNK_TAG_TYPE}:{}", self.chunk_id));
        fields.join("\t")
    }
}

/// A fully in-memory bidirected graph: the output of L1, the input to
/// the partitioner, and the mode-0 ("in-memory") traversal target.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: HashMap<NodeId, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            nodes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Undirected neighbor ids (start-side ∪ end-side).
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.neighbor_ids())
            .unwrap_or_default()
    }

    /// `(other_id, other_side)` pairs on the given side of `id`.
    pub fn children(&self, id: &NodeId, side: Side) -> Vec<(NodeId, Side)> {
        match self.nodes.get(id) {
            Some(n) => n
                .endpoints(side)
                .iter()
                .map(|e| (e.other.clone(), e.side))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Adds the symmetric mate of `(from, side, Endpoint{other,other_side,overlap})`
    /// if the peer node exists. Unknown-node edges are silently skipped by
    /// the caller before this is reached (see `gfa::reader`).
    pub fn add_edge(&mut self, from: &NodeId, from_side: Side, other: NodeId, other_side: Side, overlap: u32) {
        if let Some(n) = self.nodes.get_mut(from) {
            n.endpoints_mut(from_side).insert(Endpoint {
                other,
                side: other_side,
                overlap,
            });
        }
    }
}
