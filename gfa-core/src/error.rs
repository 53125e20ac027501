use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GfaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {detail}")]
    MalformedRecord { line: u64, detail: String },

    #[error("missing {kind} sidecar at {path}", path = path.display())]
    MissingSidecar { path: PathBuf, kind: &'static str },

    #[error("unknown node: {id}")]
    UnknownNode { id: String },

    #[error("graph corruption: {detail}")]
    Corruption { detail: String },

    #[error("partitioner stalled on a chunk of {chunk_size} nodes after {rounds} split rounds")]
    PartitionerStall { chunk_size: usize, rounds: u32 },

    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GfaError>;
