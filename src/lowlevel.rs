//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the individual stages behind [`crate::Detector`]: per-record
//! decoding, the grid cell-index convention, single-box filtering, and the
//! incremental tree builder. Most users should prefer `Detector`.

pub use crate::candidate::nms::{nms_boxes, SuppressParams};
pub use crate::candidate::Candidate;
pub use crate::decode::{cell_index, BoxDecoder, DecodedBox, BOX_PARAMS};
pub use crate::filter::{filter_box, filter_boxes, FilterParams};
#[cfg(feature = "rayon")]
pub use crate::filter::filter_boxes_par;
pub use crate::tree::{Ancestors, TreeBuilder};
