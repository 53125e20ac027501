//! Low-level GFA line formatting shared by the chunked writer (L3).

use super::gfa_orientation_chars;
use crate::model::Node;

/// One node's S-line followed by one L-line per endpoint in its
/// `start` set and one per endpoint in its `end` set (spec §4.3).
/// Every endpoint is emitted unconditionally (see SPEC_FULL.md §4):
/// duplication across chunk boundaries is intentional.
pub fn format_node_records(node: &Node) -> Vec<String> {
    let mut lines = Vec::with_capacity(1 + node.start.len() + node.end.len());
    lines.push(node.to_gfa_s_line());

    for ep in &node.start {
        let (oa, ob) = gfa_orientation_chars(crate::model::Side::Start, ep.side);
        lines.push(format!(
            "L\t{}\t{}\t{}\t{}\t{}M",
            node.id, oa, ep.other, ob, ep.overlap
        ));
    }
    for ep in &node.end {
        let (oa, ob) = gfa_orientation_chars(crate::model::Side::End, ep.side);
        lines.push(format!(
            "L\t{}\t{}\t{}\t{}\t{}M",
            node.id, oa, ep.other, ob, ep.overlap
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfa::reader::read_graph;
    use crate::model::NodeId;
    use std::io::Write;

    #[test]
    fn round_trips_through_the_reader() {
        let gfa = "S\tA\tACGT\nS\tB\tACGT\nL\tA\t+\tB\t+\t5M\n";
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(gfa.as_bytes()).unwrap();
        f.flush().unwrap();
        let graph = read_graph(f.path()).unwrap();

        let mut out = String::new();
        let mut ids: Vec<_> = graph.nodes.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            for line in format_node_records(graph.get(id).unwrap()) {
                out.push_str(&line);
                out.push('\n');
            }
        }

        let mut f2 = tempfile::NamedTempFile::new().unwrap();
        f2.write_all(out.as_bytes()).unwrap();
        f2.flush().unwrap();
        let graph2 = read_graph(f2.path()).unwrap();

        assert_eq!(graph2.len(), graph.len());
        let a2 = graph2.get(&NodeId::from("A")).unwrap();
        assert_eq!(a2.end.len(), 1);
    }
}
