use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "gfadev CLI (alpha)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Partition a GFA graph into size-bounded chunks and write the chunked store
    Partition {
        /// community-detection strategy: gm, kl, or lv
        algorithm: String,
        /// input GFA file
        #[arg(value_name = "IN_GFA")]
        input: PathBuf,
        /// base path the chunked store's .gfa/.index/.db/.csv are written under
        #[arg(value_name = "OUT_BASE")]
        out_base: PathBuf,
        /// upper bound: a chunk above this many nodes is split further
        upper: u32,
        /// lower bound: a chunk below this many nodes is merged into a neighbor
        lower: u32,
    },

    /// Bounded BFS neighborhood from a start node
    Bfs {
        /// for mode 0 a plain GFA file, for mode 1 a chunked store's base path
        #[arg(value_name = "IN_GFA")]
        input: PathBuf,
        /// node id to start from
        start: String,
        /// 0 = in-memory, 1 = chunked (demand-paged)
        mode: u8,
        /// neighborhood size bound
        size: usize,
        /// resident chunk cap, only meaningful for mode 1
        residency_limit: usize,
    },

    /// Enumerate superbubbles and report canonical (source, sink) pairs
    CountBubbles {
        /// for mode 0 a plain GFA file, for mode 2 a chunked store's base path
        #[arg(value_name = "IN_GFA")]
        input: PathBuf,
        /// 0 = in-memory, 2 = chunked with aggressive chunk eviction
        mode: u8,
    },
}
