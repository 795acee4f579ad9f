//! Anchor box priors.

use crate::util::{YoloTreeError, YoloTreeResult};

/// Predefined `(width, height)` priors, in grid-cell units.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorTable {
    anchors: Vec<(f32, f32)>,
}

impl AnchorTable {
    /// Creates a table from `(width, height)` pairs.
    ///
    /// The table must be non-empty and every value finite and positive.
    pub fn new(anchors: Vec<(f32, f32)>) -> YoloTreeResult<Self> {
        if anchors.is_empty() {
            return Err(YoloTreeError::config("anchor table is empty"));
        }
        if let Some(idx) = anchors
            .iter()
            .position(|&(w, h)| !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0))
        {
            let (w, h) = anchors[idx];
            return Err(YoloTreeError::config(format!(
                "anchor {idx} has invalid size ({w}, {h})"
            )));
        }
        Ok(Self { anchors })
    }

    /// Parses comma-separated floats, consumed pairwise as `(width, height)`.
    ///
    /// A single trailing comma is accepted; any other empty field is an error.
    pub fn parse(text: &str) -> YoloTreeResult<Self> {
        if text.trim().is_empty() {
            return Err(YoloTreeError::config("anchor file is empty"));
        }
        let mut fields: Vec<&str> = text.split(',').map(str::trim).collect();
        if fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        let values = fields
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if s.is_empty() {
                    return Err(YoloTreeError::config(format!(
                        "empty anchor value at position {i}"
                    )));
                }
                s.parse::<f32>()
                    .map_err(|_| YoloTreeError::config(format!("invalid anchor value {s:?}")))
            })
            .collect::<YoloTreeResult<Vec<f32>>>()?;
        if values.len() % 2 != 0 {
            return Err(YoloTreeError::config(format!(
                "anchor file holds {} values, expected (width, height) pairs",
                values.len()
            )));
        }
        Self::new(values.chunks_exact(2).map(|p| (p[0], p[1])).collect())
    }

    /// Number of anchors per grid cell.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchor `index` as `(width, height)`.
    pub fn get(&self, index: usize) -> Option<(f32, f32)> {
        self.anchors.get(index).copied()
    }

    /// All anchors in order.
    pub fn as_slice(&self) -> &[(f32, f32)] {
        &self.anchors
    }
}
