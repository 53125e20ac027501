//! L2 — community-detection-based chunk assignment (spec §4.2).

pub mod driver;
pub mod gm;
pub mod kl;
pub mod lv;
pub mod strategy;

pub use driver::{partition, CancellationToken, ChunkIdAllocator, PartitionConfig};
pub use gm::GreedyModularity;
pub use kl::KernighanLin;
pub use lv::Louvain;
pub use strategy::{AdjacencyView, CommunityStrategy};

/// Resolves the CLI-facing strategy name (`gm`, `kl`, `lv`) to a boxed
/// strategy, seeded deterministically (spec §9).
pub fn strategy_by_name(name: &str, seed: u64) -> Option<Box<dyn CommunityStrategy>> {
    match name {
        "kl" => Some(Box::new(KernighanLin::new(seed))),
        "gm" => Some(Box::new(GreedyModularity::new())),
        "lv" => Some(Box::new(Louvain::new(seed))),
        _ => None,
    }
}
