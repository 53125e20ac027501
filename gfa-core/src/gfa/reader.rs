//! L1 — streams S/L records into an in-memory adjacency view (spec §4.1).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use tracing::warn;

use super::orient;
use crate::error::{GfaError, Result};
use crate::model::{Graph, Node, NodeId, Tag, CHUNK_TAG};

struct ParsedLEdge {
    a: NodeId,
    from_start: bool,
    b: NodeId,
    to_end: bool,
    overlap: u32,
}

fn parse_tag(token: &str) -> Option<(String, Tag)> {
    let mut parts = token.splitn(3, ':');
    let name = parts.next()?;
    let type_code = parts.next()?.chars().next()?;
    let value = parts.next()?;
    Some((
        name.to_string(),
        Tag {
            type_code,
            value: value.to_string(),
        },
    ))
}

fn parse_s_line(line: &str, line_no: u64) -> Result<Node> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return Err(GfaError::MalformedRecord {
            line: line_no,
            detail: format!("S record has {} fields, need at least 3", fields.len()),
        });
    }
    let mut node = Node::new(NodeId::from(fields[1]));
    node.seq = fields[2].to_string();
    node.len = fields[2].len();
    for tag_tok in &fields[3..] {
        match parse_tag(tag_tok) {
            Some((name, tag)) => {
                if name == CHUNK_TAG {
                    match tag.value.parse::<u32>() {
                        Ok(n) => node.chunk_id = n,
                        Err(_) => warn!(line = line_no, tag = tag_tok, "malformed cid tag, ignoring"),
                    }
                }
                node.tags.insert(name, tag);
            }
            None => warn!(line = line_no, tag = tag_tok, "malformed tag token, skipping"),
        }
    }
    Ok(node)
}

fn parse_l_line(line: &str, line_no: u64) -> Result<ParsedLEdge> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(GfaError::MalformedRecord {
            line: line_no,
            detail: format!("L record has {} fields, need 6", fields.len()),
        });
    }
    let a = NodeId::from(fields[1]);
    let oa = fields[2];
    let b = NodeId::from(fields[3]);
    let ob = fields[4];
    let cigar = fields[5].trim_end();
    if !cigar.ends_with('M') {
        return Err(GfaError::MalformedRecord {
            line: line_no,
            detail: format!("L record CIGAR `{cigar}` does not end in M"),
        });
    }
    let overlap: u32 = cigar[..cigar.len() - 1].parse().map_err(|_| GfaError::MalformedRecord {
        line: line_no,
        detail: format!("L record overlap `{cigar}` is not a decimal integer"),
    })?;
    let from_start = oa == "-";
    let to_end = ob == "-";
    Ok(ParsedLEdge {
        a,
        from_start,
        b,
        to_end,
        overlap,
    })
}

/// Full read of a whole GFA file into an in-memory `Graph` (spec §4.1).
///
/// S-lines are materialized immediately; L-lines are deferred and
/// applied once every S-line has been seen, so an edge referencing an
/// id not declared anywhere in the file is skipped with a warning
/// rather than aborting the read.
pub fn read_graph(path: &Path) -> Result<Graph> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut graph = Graph::new();
    let mut deferred: Vec<(u64, String)> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx as u64 + 1;
        let line = line?;
        if line.starts_with('S') {
            let node = parse_s_line(&line, line_no)?;
            graph.insert(node);
        } else if line.starts_with('L') {
            deferred.push((line_no, line));
        }
        // anything else is ignored per spec §6.
    }

    apply_deferred_edges_strict(&mut graph, &deferred)?;
    Ok(graph)
}

/// Applies deferred L-lines to a fully loaded node table. An edge is
/// skipped (with a warning) unless *both* endpoints are present — this
/// is the full-graph semantics where every id should be known.
fn apply_deferred_edges_strict(graph: &mut Graph, deferred: &[(u64, String)]) -> Result<()> {
    for (line_no, line) in deferred {
        let edge = parse_l_line(line, *line_no)?;
        if !graph.contains(&edge.a) {
            warn!(
                line = line_no,
                from = %edge.a,
                to = %edge.b,
                "edge references unknown node, skipping"
            );
            continue;
        }
        if !graph.contains(&edge.b) {
            warn!(
                line = line_no,
                from = %edge.a,
                to = %edge.b,
                "edge references unknown node, skipping"
            );
            continue;
        }
        let (a_side, a_other_side, b_side, b_other_side) = orient(edge.from_start, edge.to_end);
        graph.add_edge(&edge.a, a_side, edge.b.clone(), a_other_side, edge.overlap);
        graph.add_edge(&edge.b, b_side, edge.a.clone(), b_other_side, edge.overlap);
    }
    Ok(())
}

/// Reads exactly `n_records` newline-terminated S/L records starting at
/// `offset`, inserting new nodes into `into` and applying L-lines
/// *independently per side*: an endpoint is added on whichever of the
/// two incident nodes is already present in `into`, without requiring
/// both (spec §4.4's cross-chunk edge handling). A record that fails to
/// parse within the declared range is `GfaError::Corruption`, since the
/// index promised exactly these records are well-formed.
pub fn read_chunk_records(
    file: &mut File,
    offset: u64,
    n_records: u32,
    into: &mut HashMap<NodeId, Node>,
) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file.try_clone()?);
    let mut deferred: Vec<String> = Vec::new();

    for i in 0..n_records {
        let mut buf = String::new();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Err(GfaError::Corruption {
                detail: format!(
                    "chunk index promised {n_records} records at offset {offset}, file ended after {i}"
                ),
            });
        }
        let line = buf.trim_end_matches(['\n', '\r']);
        if line.starts_with('S') {
            let node = parse_s_line(line, i as u64)
                .map_err(|e| GfaError::Corruption { detail: e.to_string() })?;
            into.insert(node.id.clone(), node);
        } else if line.starts_with('L') {
            deferred.push(line.to_string());
        } else {
            return Err(GfaError::Corruption {
                detail: format!("unexpected record kind in chunk range: `{line}`"),
            });
        }
    }

    for (i, line) in deferred.iter().enumerate() {
        let edge = parse_l_line(line, i as u64)
            .map_err(|e| GfaError::Corruption { detail: e.to_string() })?;
        let (a_side, a_other_side, b_side, b_other_side) = orient(edge.from_start, edge.to_end);
        if into.contains_key(&edge.a) {
            if let Some(n) = into.get_mut(&edge.a) {
                n.endpoints_mut(a_side).insert(crate::model::Endpoint {
                    other: edge.b.clone(),
                    side: a_other_side,
                    overlap: edge.overlap,
                });
            }
        }
        if into.contains_key(&edge.b) {
            if let Some(n) = into.get_mut(&edge.b) {
                n.endpoints_mut(b_side).insert(crate::model::Endpoint {
                    other: edge.a.clone(),
                    side: b_other_side,
                    overlap: edge.overlap,
                });
            }
        }
    }
    Ok(())
}

/// Reopens `path` (used by the demand-paged graph, which owns the file
/// handle for its whole lifetime).
pub fn open_for_paging(path: &Path) -> Result<File> {
    let f = File::open(path)?;
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_linear_graph() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nS\tC\tACGT\nS\tD\tACGT\n\
                   L\tA\t+\tB\t+\t5M\nL\tB\t+\tC\t+\t5M\nL\tC\t+\tD\t+\t5M\n";
        let f = write_tmp(gfa);
        let graph = read_graph(f.path()).unwrap();
        assert_eq!(graph.len(), 4);
        let a = graph.get(&NodeId::from("A")).unwrap();
        assert_eq!(a.end.len(), 1);
        let b = graph.get(&NodeId::from("B")).unwrap();
        assert_eq!(b.start.len(), 1);
        assert_eq!(b.end.len(), 1);
    }

    #[test]
    fn skips_edges_to_unknown_nodes() {
        let gfa = "S\tA\tACGT\nL\tA\t+\tZ\t+\t3M\n";
        let f = write_tmp(gfa);
        let graph = read_graph(f.path()).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.get(&NodeId::from("A")).unwrap().end.is_empty());
    }

    #[test]
    fn duplicate_l_lines_collapse_via_set_semantics() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nL\tA\t+\tB\t+\t5M\nL\tA\t+\tB\t+\t5M\n";
        let f = write_tmp(gfa);
        let graph = read_graph(f.path()).unwrap();
        assert_eq!(graph.get(&NodeId::from("A")).unwrap().end.len(), 1);
    }

    #[test]
    fn cid_tag_sets_chunk_id() {
        let gfa = "S\tA\tACGT\tcid:i:7\n";
        let f = write_tmp(gfa);
        let graph = read_graph(f.path()).unwrap();
        assert_eq!(graph.get(&NodeId::from("A")).unwrap().chunk_id, 7);
    }
}
