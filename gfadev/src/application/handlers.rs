use std::num::NonZeroUsize;
use std::path::PathBuf;

use gfa_core::chunked::{write_chunked, LookupMode, PagedGraph, PagedGraphOptions};
use gfa_core::error::{GfaError, Result};
use gfa_core::gfa::reader::read_graph;
use gfa_core::partition::{partition, strategy_by_name, PartitionConfig};
use gfa_core::traverse::{bfs, count_bubbles_in_memory, count_bubbles_paged, CountBubblesMode};
use gfa_core::NodeId;

/// A fixed seed, not exposed on the CLI surface: the reference CLI
/// (spec §6) takes no seed argument, and a constant keeps `partition`
/// runs on the same input reproducible across invocations.
const DEFAULT_SEED: u64 = 0;

pub fn handle_partition(algorithm: String, input: PathBuf, out_base: PathBuf, upper: u32, lower: u32) -> Result<()> {
    let mut graph = read_graph(&input)?;
    let cfg = PartitionConfig::new(upper, lower)?;
    let strategy = strategy_by_name(&algorithm, DEFAULT_SEED).ok_or_else(|| GfaError::Config {
        detail: format!("unknown partition algorithm `{algorithm}` (expected gm, kl, or lv)"),
    })?;

    let groups = partition(&graph, strategy.as_ref(), &cfg, None)?;
    let report = write_chunked(&mut graph, &groups, &out_base)?;

    println!(
        "wrote {} chunks, {} nodes, {} records to {}",
        report.chunk_count,
        report.node_count,
        report.record_count,
        out_base.display()
    );
    Ok(())
}

pub fn handle_bfs(input: PathBuf, start: String, mode: u8, size: usize, residency_limit: usize) -> Result<()> {
    let start_id = NodeId::from(start.as_str());

    let neighborhood = match mode {
        0 => {
            let mut graph = read_graph(&input)?;
            bfs(&mut graph, &start_id, size)?
        }
        1 => {
            let limit = NonZeroUsize::new(residency_limit).ok_or_else(|| GfaError::Config {
                detail: "residency-limit must be positive".to_string(),
            })?;
            let opts = PagedGraphOptions {
                residency_limit: limit,
                lookup_mode: LookupMode::default(),
            };
            let mut graph = PagedGraph::open(&input, opts)?;
            graph.bfs(&start_id, size)?
        }
        other => {
            return Err(GfaError::Config {
                detail: format!("bfs mode must be 0 (in-memory) or 1 (chunked), got {other}"),
            })
        }
    };

    let mut ids: Vec<String> = neighborhood.into_iter().map(|id| id.to_string()).collect();
    ids.sort();
    println!("neighborhood of {start} ({} nodes):", ids.len());
    for id in ids {
        println!("  {id}");
    }
    Ok(())
}

pub fn handle_count_bubbles(input: PathBuf, mode: u8) -> Result<()> {
    let bubbles = match mode {
        0 => {
            let graph = read_graph(&input)?;
            count_bubbles_in_memory(&graph)?
        }
        2 => {
            let opts = PagedGraphOptions::default();
            let mut graph = PagedGraph::open(&input, opts)?;
            count_bubbles_paged(&mut graph, CountBubblesMode::ChunkedAggressiveEvict)?
        }
        other => {
            return Err(GfaError::Config {
                detail: format!("count-bubbles mode must be 0 (in-memory) or 2 (chunked-aggressive-evict), got {other}"),
            })
        }
    };

    println!("found {} bubble(s):", bubbles.len());
    for (source, sink) in &bubbles {
        println!("  {source} <-> {sink}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_gfa(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("in.gfa");
        std::fs::write(
            &path,
            "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\nS\tD\tACGT\n\
             L\tA\t+\tB\t+\t5M\nL\tB\t+\tC\t+\t5M\nL\tC\t+\tD\t+\t5M\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn partition_then_chunked_bfs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = linear_gfa(dir.path());
        let out_base = dir.path().join("out");

        handle_partition("kl".to_string(), input, out_base.clone(), 2, 4).unwrap();
        handle_bfs(out_base, "A".to_string(), 1, 10, 10).unwrap();
    }

    #[test]
    fn in_memory_bfs_on_plain_gfa() {
        let dir = tempfile::tempdir().unwrap();
        let input = linear_gfa(dir.path());
        handle_bfs(input, "A".to_string(), 0, 10, 10).unwrap();
    }

    #[test]
    fn unknown_algorithm_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = linear_gfa(dir.path());
        let out_base = dir.path().join("out");
        let err = handle_partition("bogus".to_string(), input, out_base, 2, 4).unwrap_err();
        assert!(matches!(err, GfaError::Config { .. }));
    }

    #[test]
    fn unknown_bfs_mode_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = linear_gfa(dir.path());
        let err = handle_bfs(input, "A".to_string(), 7, 10, 10).unwrap_err();
        assert!(matches!(err, GfaError::Config { .. }));
    }

    #[test]
    fn count_bubbles_in_memory_on_linear_graph_finds_none() {
        let dir = tempfile::tempdir().unwrap();
        let input = linear_gfa(dir.path());
        handle_count_bubbles(input, 0).unwrap();
    }
}
