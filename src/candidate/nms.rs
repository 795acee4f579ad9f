//! Greedy non-maximum suppression over scored boxes.

use crate::candidate::{sort_candidates_desc, Candidate};
use crate::trace::{trace_event, trace_span};

/// Parameters for [`nms_boxes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuppressParams {
    /// Maximum number of boxes to keep.
    pub max_boxes: usize,
    /// Candidates scoring below this value are discarded up front.
    pub score_threshold: f32,
    /// A box is suppressed when its IoU with a kept box is at least this.
    pub iou_threshold: f32,
}

/// Applies class-agnostic greedy NMS.
///
/// Candidates are sorted by descending score and kept if their IoU with every
/// previously kept box stays below `iou_threshold`, until `max_boxes` are kept.
/// The output is sorted by descending score, so running it again with the
/// same parameters returns the same list.
pub fn nms_boxes(candidates: &[Candidate], params: SuppressParams) -> Vec<Candidate> {
    let _span = trace_span!("suppress", candidates = candidates.len()).entered();

    let mut sorted: Vec<Candidate> = candidates
        .iter()
        .copied()
        .filter(|c| c.score >= params.score_threshold)
        .collect();
    sort_candidates_desc(&mut sorted);

    let mut kept: Vec<Candidate> = Vec::with_capacity(params.max_boxes.min(sorted.len()));
    'outer: for cand in sorted {
        if kept.len() >= params.max_boxes {
            break;
        }
        for kept_cand in kept.iter() {
            if kept_cand.bbox.iou(&cand.bbox) >= params.iou_threshold {
                continue 'outer;
            }
        }
        kept.push(cand);
    }

    trace_event!("kept_boxes", count = kept.len());
    kept
}
