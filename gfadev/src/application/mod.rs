pub mod handlers;

use clap::Parser;
use gfa_core::error::Result;

use crate::presentation::cli::{Cli, Commands};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Partition {
            algorithm,
            input,
            out_base,
            upper,
            lower,
        } => handlers::handle_partition(algorithm, input, out_base, upper, lower),
        Commands::Bfs {
            input,
            start,
            mode,
            size,
            residency_limit,
        } => handlers::handle_bfs(input, start, mode, size, residency_limit),
        Commands::CountBubbles { input, mode } => handlers::handle_count_bubbles(input, mode),
    }
}
