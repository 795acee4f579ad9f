//! Decoding raw grid output into normalized boxes.
//!
//! Each grid cell carries `num_anchors` records of `5 + num_nodes` values:
//! `tx, ty, tw, th, to` followed by one logit per tree node. Box geometry is
//! recovered with the usual YOLOv2 parameterization, and the class logits are
//! normalized with an independent softmax per sibling group of the label
//! tree, yielding conditional probabilities.

mod anchors;
#[cfg(feature = "rayon")]
mod rayon;

pub use anchors::AnchorTable;

use crate::geometry::BoxCorners;
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::tree::LabelTree;
use crate::util::math::{sigmoid, softmax_into};
use crate::util::{YoloTreeError, YoloTreeResult};

/// Number of box values preceding the class logits of each anchor record.
pub const BOX_PARAMS: usize = 5;

/// One decoded anchor prediction.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedBox {
    /// Normalized corner box.
    pub bbox: BoxCorners,
    /// Objectness, `sigmoid(to)`.
    pub confidence: f32,
    /// Per-node probability conditioned on the node's father.
    pub class_probs: Vec<f32>,
}

/// Cell offset added to the predicted center of cell `(row, col)`.
///
/// The index pairs are laid out with the height index varying fastest: the
/// flat cell position `p = row * width + col` maps to
/// `(p % height, p / height)`. On square grids this is `(col, row)`, i.e.
/// `(x, y)`. Any other ordering transposes detections.
pub fn cell_index(row: usize, col: usize, height: usize, width: usize) -> (f32, f32) {
    let p = row * width + col;
    ((p % height) as f32, (p / height) as f32)
}

/// Decoder bound to a tree and anchor table.
#[derive(Clone, Copy, Debug)]
pub struct BoxDecoder<'a> {
    tree: &'a LabelTree,
    anchors: &'a AnchorTable,
}

impl<'a> BoxDecoder<'a> {
    /// Creates a decoder.
    pub fn new(tree: &'a LabelTree, anchors: &'a AnchorTable) -> Self {
        Self { tree, anchors }
    }

    /// Values per anchor record: `5 + num_nodes`.
    pub fn record_len(&self) -> usize {
        BOX_PARAMS + self.tree.len()
    }

    /// Channels per grid cell expected from the model.
    pub fn expected_channels(&self) -> usize {
        self.anchors.len() * self.record_len()
    }

    /// Fails with `ShapeMismatch` when the channel count does not match.
    pub fn check_shape(&self, tensor: &TensorView<'_>) -> YoloTreeResult<()> {
        let expected = self.expected_channels();
        if tensor.channels() != expected {
            return Err(YoloTreeError::ShapeMismatch {
                expected,
                got: tensor.channels(),
                context: "tensor channels",
            });
        }
        Ok(())
    }

    /// Decodes every batch entry.
    pub fn decode(&self, tensor: TensorView<'_>) -> YoloTreeResult<Vec<Vec<DecodedBox>>> {
        (0..tensor.batch())
            .map(|b| self.decode_image(tensor, b))
            .collect()
    }

    /// Decodes batch entry `b` into boxes ordered by row, column, anchor.
    pub fn decode_image(&self, tensor: TensorView<'_>, b: usize) -> YoloTreeResult<Vec<DecodedBox>> {
        self.check_batch(&tensor, b)?;
        let _span = trace_span!(
            "decode",
            batch = b,
            height = tensor.height(),
            width = tensor.width()
        )
        .entered();

        let boxes: Vec<DecodedBox> = (0..tensor.height())
            .flat_map(|row| self.decode_row(tensor, b, row))
            .collect();
        trace_event!("decoded_boxes", count = boxes.len());
        Ok(boxes)
    }

    /// Parallel variant of [`BoxDecoder::decode_image`]; rows are decoded on
    /// the rayon pool and concatenated in order.
    #[cfg(feature = "rayon")]
    pub fn decode_image_par(
        &self,
        tensor: TensorView<'_>,
        b: usize,
    ) -> YoloTreeResult<Vec<DecodedBox>> {
        self.check_batch(&tensor, b)?;
        let _span = trace_span!("decode_par", batch = b).entered();
        let boxes = self::rayon::decode_rows_par(self, tensor, b);
        trace_event!("decoded_boxes", count = boxes.len());
        Ok(boxes)
    }

    fn check_batch(&self, tensor: &TensorView<'_>, b: usize) -> YoloTreeResult<()> {
        self.check_shape(tensor)?;
        if b >= tensor.batch() {
            return Err(YoloTreeError::IndexOutOfBounds {
                index: b,
                len: tensor.batch(),
                context: "batch",
            });
        }
        Ok(())
    }

    /// Decodes all anchors of one grid row. Shape must already be checked.
    pub(crate) fn decode_row(&self, tensor: TensorView<'_>, b: usize, row: usize) -> Vec<DecodedBox> {
        let (height, width) = (tensor.height(), tensor.width());
        let grid_dims = (height as f32, width as f32);
        let record_len = self.record_len();
        let Some(values) = tensor.row(b, row) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(width * self.anchors.len());
        for (col, cell) in values.chunks_exact(tensor.channels()).enumerate() {
            let offset = cell_index(row, col, height, width);
            for (raw, &anchor) in cell
                .chunks_exact(record_len)
                .zip(self.anchors.as_slice())
            {
                out.push(self.decode_record_unchecked(raw, anchor, offset, grid_dims));
            }
        }
        out
    }

    /// Decodes a single anchor record.
    ///
    /// `cell` is the cell offset from [`cell_index`] and `grid_dims` is
    /// `(height, width)`; both are applied component-wise to `(x, y)`.
    /// `raw` must hold exactly [`BoxDecoder::record_len`] values.
    pub fn decode_record(
        &self,
        raw: &[f32],
        anchor: (f32, f32),
        cell: (f32, f32),
        grid_dims: (f32, f32),
    ) -> YoloTreeResult<DecodedBox> {
        if raw.len() != self.record_len() {
            return Err(YoloTreeError::ShapeMismatch {
                expected: self.record_len(),
                got: raw.len(),
                context: "anchor record",
            });
        }
        Ok(self.decode_record_unchecked(raw, anchor, cell, grid_dims))
    }

    fn decode_record_unchecked(
        &self,
        raw: &[f32],
        anchor: (f32, f32),
        cell: (f32, f32),
        grid_dims: (f32, f32),
    ) -> DecodedBox {
        let cx = (sigmoid(raw[0]) + cell.0) / grid_dims.0;
        let cy = (sigmoid(raw[1]) + cell.1) / grid_dims.1;
        let w = raw[2].exp() * anchor.0 / grid_dims.0;
        let h = raw[3].exp() * anchor.1 / grid_dims.1;
        let confidence = sigmoid(raw[4]);

        let logits = &raw[BOX_PARAMS..BOX_PARAMS + self.tree.len()];
        let mut class_probs = vec![0.0f32; self.tree.len()];
        for group in self.tree.groups() {
            let range = group.range();
            softmax_into(&logits[range.clone()], &mut class_probs[range]);
        }

        DecodedBox {
            bbox: BoxCorners::from_center_size(cx, cy, w, h),
            confidence,
            class_probs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{cell_index, AnchorTable, BoxDecoder};
    use crate::tensor::TensorView;
    use crate::tree::LabelTree;
    use crate::util::YoloTreeError;

    fn tree() -> LabelTree {
        LabelTree::parse("a -1\nb -1\nc 0\nd 0\ne 0\n").unwrap()
    }

    #[test]
    fn cell_index_on_square_grid_is_col_row() {
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(cell_index(row, col, 4, 4), (col as f32, row as f32));
            }
        }
    }

    #[test]
    fn cell_index_varies_height_fastest() {
        // 2 rows x 3 cols: flat positions 0..6 map to (p % 2, p / 2).
        let got: Vec<_> = (0..2)
            .flat_map(|r| (0..3).map(move |c| cell_index(r, c, 2, 3)))
            .collect();
        assert_eq!(
            got,
            vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 2.0), (1.0, 2.0)]
        );
    }

    #[test]
    fn softmax_is_applied_per_group() {
        let tree = tree();
        let anchors = AnchorTable::new(vec![(1.0, 1.0)]).unwrap();
        let decoder = BoxDecoder::new(&tree, &anchors);
        let raw = [0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 3.0, 1.0, 1.0, 1.0];
        let decoded = decoder
            .decode_record(&raw, (1.0, 1.0), (0.0, 0.0), (1.0, 1.0))
            .unwrap();
        let p = &decoded.class_probs;
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[1] - 0.5).abs() < 1e-6);
        for &v in &p[2..] {
            assert!((v - 1.0 / 3.0).abs() < 1e-6);
        }
        assert!((decoded.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn short_record_is_a_shape_mismatch() {
        let tree = LabelTree::parse("a -1\nb 0\nc 0\n").unwrap();
        let anchors = AnchorTable::new(vec![(1.0, 1.0)]).unwrap();
        let decoder = BoxDecoder::new(&tree, &anchors);
        let err = decoder
            .decode_record(&[0.0; 6], (1.0, 1.0), (0.0, 0.0), (1.0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            YoloTreeError::ShapeMismatch {
                expected: 8,
                got: 6,
                context: "anchor record",
            }
        );
        assert!(decoder
            .decode_record(&[0.0; 9], (1.0, 1.0), (0.0, 0.0), (1.0, 1.0))
            .is_err());
    }

    #[test]
    fn rejects_channel_mismatch() {
        let tree = tree();
        let anchors = AnchorTable::new(vec![(1.0, 1.0), (2.0, 2.0)]).unwrap();
        let decoder = BoxDecoder::new(&tree, &anchors);
        let data = vec![0.0f32; 19];
        let tensor = TensorView::new(&data, [1, 1, 1, 19]).unwrap();
        let err = decoder.decode_image(tensor, 0).unwrap_err();
        assert_eq!(
            err,
            YoloTreeError::ShapeMismatch {
                expected: 20,
                got: 19,
                context: "tensor channels",
            }
        );
    }
}
