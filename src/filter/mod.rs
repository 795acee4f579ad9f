//! Score filtering of decoded boxes through the label tree.
//!
//! For each box the conditional class probabilities are turned into absolute
//! ones, scaled by the box confidence, and handed to the top-down tree walk.
//! Boxes for which the walk accepts nothing are dropped; survivors are
//! rescaled to pixel coordinates.

#[cfg(feature = "rayon")]
mod rayon;

use crate::candidate::Candidate;
use crate::decode::DecodedBox;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::tree::LabelTree;
use crate::util::{YoloTreeError, YoloTreeResult};

/// Parameters for [`filter_boxes`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    /// Minimum combined score accepted at each step of the tree walk.
    pub score_threshold: f32,
    /// Image height in pixels.
    pub image_height: usize,
    /// Image width in pixels.
    pub image_width: usize,
}

/// Filters decoded boxes into pixel-space candidates, preserving input order.
pub fn filter_boxes(
    boxes: Vec<DecodedBox>,
    tree: &LabelTree,
    params: FilterParams,
) -> YoloTreeResult<Vec<Candidate>> {
    let _span = trace_span!("filter", boxes = boxes.len()).entered();
    let mut out = Vec::new();
    for decoded in boxes {
        if let Some(cand) = filter_box(decoded, tree, params)? {
            out.push(cand);
        }
    }
    trace_event!("candidates", count = out.len());
    Ok(out)
}

/// Parallel variant of [`filter_boxes`] with identical output order.
#[cfg(feature = "rayon")]
pub fn filter_boxes_par(
    boxes: Vec<DecodedBox>,
    tree: &LabelTree,
    params: FilterParams,
) -> YoloTreeResult<Vec<Candidate>> {
    let _span = trace_span!("filter_par", boxes = boxes.len()).entered();
    let out = self::rayon::filter_boxes_par(boxes, tree, params)?;
    trace_event!("candidates", count = out.len());
    Ok(out)
}

/// Runs the tree prediction for one box.
///
/// Returns `Ok(None)` when the box is rejected, either because the root group
/// scored below the threshold or because its geometry is degenerate.
pub fn filter_box(
    decoded: DecodedBox,
    tree: &LabelTree,
    params: FilterParams,
) -> YoloTreeResult<Option<Candidate>> {
    let DecodedBox {
        bbox,
        confidence,
        class_probs: mut scores,
    } = decoded;

    if !bbox.is_valid() || !confidence.is_finite() {
        trace_debug!(
            "degenerate_box_dropped",
            y_min = bbox.y_min,
            x_min = bbox.x_min,
            y_max = bbox.y_max,
            x_max = bbox.x_max,
            confidence = confidence
        );
        return Ok(None);
    }

    tree.propagate_absolute(&mut scores)?;
    for s in scores.iter_mut() {
        *s *= confidence;
    }

    let Some(pred) = tree.predict_top_down(&scores, params.score_threshold)? else {
        return Ok(None);
    };

    Ok(Some(Candidate {
        bbox: bbox.scale(params.image_height as f32, params.image_width as f32),
        score: pred.prob,
        node: pred.node,
    }))
}

pub(crate) fn validate_params(params: &FilterParams) -> YoloTreeResult<()> {
    if !params.score_threshold.is_finite() {
        return Err(YoloTreeError::InvalidInput("score threshold must be finite"));
    }
    if params.image_height == 0 || params.image_width == 0 {
        return Err(YoloTreeError::InvalidInput("image size must be non-zero"));
    }
    Ok(())
}
