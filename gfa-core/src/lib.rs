//! Out-of-core storage and traversal over large bidirected GFA graphs.
//!
//! Three tightly-coupled subsystems, leaves first: [`gfa`] reads the
//! text dialect into an in-memory [`model::Graph`]; [`partition`]
//! assigns every node to a size-bounded chunk; [`chunked`] rewrites
//! the graph so chunks are contiguous on disk and serves demand-paged
//! access to it; [`traverse`] runs BFS and superbubble detection
//! against either representation.

pub mod chunked;
pub mod error;
pub mod gfa;
pub mod model;
pub mod partition;
pub mod rng;
pub mod traverse;

pub use error::{GfaError, Result};
pub use model::{Graph, Node, NodeId, Side};
