//! Scored detection candidates and their pruning.
//!
//! Candidates come out of the filter stage in pixel coordinates and are
//! reduced by greedy non-maximum suppression.

pub(crate) mod nms;

use crate::geometry::BoxCorners;
use std::cmp::Ordering;

/// Box that passed the top-down tree prediction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Pixel-space corner box.
    pub bbox: BoxCorners,
    /// Combined score: absolute node probability times confidence.
    pub score: f32,
    /// Predicted label tree node.
    pub node: usize,
}

fn candidate_cmp_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.node.cmp(&b.node))
}

/// Sorts candidates by descending score; ties keep lower node indices first
/// and otherwise preserve input order.
pub(crate) fn sort_candidates_desc(candidates: &mut [Candidate]) {
    candidates.sort_by(candidate_cmp_desc);
}
