//! The chunked on-disk store: writer (L3) and demand-paged reader (L4).

pub mod db;
pub mod index;
pub mod paged;
pub mod writer;

pub use db::ChunkDb;
pub use index::{ChunkIndex, ChunkIndexEntry};
pub use paged::{LookupMode, PagedGraph, PagedGraphOptions};
pub use writer::{write_chunked, WriteReport};
