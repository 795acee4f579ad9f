//! Error types for yolotree.

use thiserror::Error;

/// Result alias for yolotree operations.
pub type YoloTreeResult<T> = std::result::Result<T, YoloTreeError>;

/// Errors that can occur when loading assets or running the detection pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum YoloTreeError {
    /// A tree definition line is malformed or violates the tree ordering.
    #[error("tree parse error at line {line}: {reason}")]
    TreeParse {
        /// 1-based line (or entry) number.
        line: usize,
        reason: String,
    },
    /// Tensor or vector sizes disagree with the loaded tree and anchors.
    #[error("shape mismatch for {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// An anchor, names, or tree file could not be read or understood.
    #[error("config error: {reason}")]
    Config { reason: String },
    /// Tensor dimensions must be non-zero.
    #[error("invalid tensor dimensions {batch}x{height}x{width}x{channels}")]
    InvalidDimensions {
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
    },
    /// The backing buffer is shorter than the declared tensor shape.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// An index is outside the valid range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl YoloTreeError {
    pub(crate) fn tree_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::TreeParse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
