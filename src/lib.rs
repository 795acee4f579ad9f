//! yolotree post-processes YOLO9000-style grid output with a hierarchical
//! label tree.
//!
//! Class logits are normalized per sibling group of the tree, turned into
//! absolute probabilities along each node's root path, and resolved by a
//! top-down walk that stops at the deepest confidently predicted node. The
//! surviving boxes are pruned with greedy non-maximum suppression. Optional
//! parallelism is available via the `rayon` feature.

mod candidate;
pub mod decode;
pub mod detect;
pub mod filter;
pub mod geometry;
pub mod io;
pub mod lowlevel;
pub mod tensor;
mod trace;
pub mod tree;
pub mod util;

pub use candidate::nms::{nms_boxes, SuppressParams};
pub use candidate::Candidate;
pub use decode::{AnchorTable, BoxDecoder, DecodedBox};
pub use detect::{DetectConfig, Detection, Detector};
pub use filter::{filter_boxes, FilterParams};
pub use geometry::BoxCorners;
pub use tensor::TensorView;
pub use tree::{Group, LabelTree, Prediction};
pub use util::{YoloTreeError, YoloTreeResult};
