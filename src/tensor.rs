//! Borrowed view over raw detector output.
//!
//! `TensorView` wraps a contiguous channels-last buffer of shape
//! `[batch, grid_height, grid_width, channels]`. The channel axis packs
//! `num_anchors * (5 + num_nodes)` values per cell; the decoder checks that
//! split against the tree and anchor table.

use crate::util::{YoloTreeError, YoloTreeResult};

/// Borrowed `[batch, height, width, channels]` tensor.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a view, validating the shape against the buffer length.
    pub fn new(data: &'a [f32], shape: [usize; 4]) -> YoloTreeResult<Self> {
        let [batch, height, width, channels] = shape;
        let needed = required_len(shape)?;
        if data.len() < needed {
            return Err(YoloTreeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data: &data[..needed],
            batch,
            height,
            width,
            channels,
        })
    }

    /// Number of images in the batch.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Grid height (rows).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid width (columns).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Values per grid cell.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Shape as `[batch, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        [self.batch, self.height, self.width, self.channels]
    }

    /// Backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// All cells of grid row `row` in batch entry `b`, back to back.
    pub fn row(&self, b: usize, row: usize) -> Option<&'a [f32]> {
        if b >= self.batch || row >= self.height {
            return None;
        }
        let row_len = self.width * self.channels;
        let start = (b * self.height + row) * row_len;
        self.data.get(start..start + row_len)
    }
}

fn required_len(shape: [usize; 4]) -> YoloTreeResult<usize> {
    let [batch, height, width, channels] = shape;
    let invalid = YoloTreeError::InvalidDimensions {
        batch,
        height,
        width,
        channels,
    };
    if shape.iter().any(|&d| d == 0) {
        return Err(invalid);
    }
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(invalid)
}
