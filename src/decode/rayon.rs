//! Row-parallel decoding (feature-gated).

use crate::decode::{BoxDecoder, DecodedBox};
use crate::tensor::TensorView;
use rayon::prelude::*;

/// Decodes the rows of batch entry `b` in parallel, preserving row order.
pub(crate) fn decode_rows_par(
    decoder: &BoxDecoder<'_>,
    tensor: TensorView<'_>,
    b: usize,
) -> Vec<DecodedBox> {
    let rows: Vec<Vec<DecodedBox>> = (0..tensor.height())
        .into_par_iter()
        .map(|row| decoder.decode_row(tensor, b, row))
        .collect();
    rows.into_iter().flatten().collect()
}
