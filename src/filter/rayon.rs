//! Box-parallel filtering (feature-gated).

use crate::candidate::Candidate;
use crate::decode::DecodedBox;
use crate::filter::{filter_box, FilterParams};
use crate::tree::LabelTree;
use crate::util::YoloTreeResult;
use rayon::prelude::*;

pub(crate) fn filter_boxes_par(
    boxes: Vec<DecodedBox>,
    tree: &LabelTree,
    params: FilterParams,
) -> YoloTreeResult<Vec<Candidate>> {
    let results: Vec<Option<Candidate>> = boxes
        .into_par_iter()
        .map(|decoded| filter_box(decoded, tree, params))
        .collect::<YoloTreeResult<_>>()?;
    Ok(results.into_iter().flatten().collect())
}
