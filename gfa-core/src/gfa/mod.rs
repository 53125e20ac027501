//! The GFA text dialect: reading into the in-memory model (L1) and the
//! low-level line formatting shared by the chunked writer (L3).

pub mod reader;
pub mod writer;

use crate::model::Side;

/// Spec §4.1's orientation table, as a pure function both the reader
/// and the writer consume so the mapping lives in exactly one place.
///
/// Returns `(a_side, a_other_side, b_side, b_other_side)`: the
/// endpoint stored on `A` is `(B, a_other_side, overlap)` added to
/// `A`'s `a_side` set, and symmetrically for `B`.
pub fn orient(from_start: bool, to_end: bool) -> (Side, Side, Side, Side) {
    match (from_start, to_end) {
        (true, true) => (Side::Start, Side::End, Side::End, Side::Start),
        (true, false) => (Side::Start, Side::Start, Side::Start, Side::Start),
        (false, false) => (Side::End, Side::Start, Side::Start, Side::End),
        (false, true) => (Side::End, Side::End, Side::End, Side::End),
    }
}

/// Inverse of `orient`: given the side an endpoint is stored under on
/// the node emitting it (`self_side`) and the side of the endpoint's
/// target (`other_side`), reconstruct the L-line's `(oa, ob)` orientation
/// characters for `L <self> <oa> <other> <ob> <k>M`.
pub fn gfa_orientation_chars(self_side: Side, other_side: Side) -> (char, char) {
    match (self_side, other_side) {
        (Side::Start, Side::Start) => ('-', '+'),
        (Side::Start, Side::End) => ('-', '-'),
        (Side::End, Side::Start) => ('+', '+'),
        (Side::End, Side::End) => ('+', '-'),
    }
}
