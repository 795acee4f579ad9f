//! High-level detection pipeline.
//!
//! A [`Detector`] owns the label tree, the anchor table and optional class
//! names. It is built once and only read afterwards, so one instance can be
//! shared across threads and images.

use crate::candidate::nms::{nms_boxes, SuppressParams};
use crate::decode::{AnchorTable, BoxDecoder};
use crate::filter::{filter_boxes, validate_params, FilterParams};
use crate::geometry::BoxCorners;
use crate::tensor::TensorView;
use crate::trace::trace_span;
use crate::tree::LabelTree;
use crate::util::{YoloTreeError, YoloTreeResult};

/// Pipeline thresholds.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Minimum combined score for the tree walk and for suppression.
    pub score_threshold: f32,
    /// IoU at or above which a lower-scored box is suppressed.
    pub iou_threshold: f32,
    /// Maximum detections per image.
    pub max_boxes: usize,
    /// Decode and filter on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.12,
            iou_threshold: 0.4,
            max_boxes: 10,
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Checks that thresholds are usable.
    pub fn validate(&self) -> YoloTreeResult<()> {
        if !self.score_threshold.is_finite() {
            return Err(YoloTreeError::InvalidInput("score threshold must be finite"));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(YoloTreeError::InvalidInput("iou threshold must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Final labeled detection in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Pixel-space corner box.
    pub bbox: BoxCorners,
    /// Combined score.
    pub score: f32,
    /// Label tree node index.
    pub class: usize,
    /// Class name, or the node's tree id when no names are loaded.
    pub label: String,
}

/// Tree-based detector over raw grid output.
#[derive(Clone, Debug)]
pub struct Detector {
    tree: LabelTree,
    anchors: AnchorTable,
    names: Option<Vec<String>>,
    cfg: DetectConfig,
}

impl Detector {
    /// Creates a detector with the default configuration.
    pub fn new(tree: LabelTree, anchors: AnchorTable) -> Self {
        Self {
            tree,
            anchors,
            names: None,
            cfg: DetectConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: DetectConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Attaches one display name per tree node.
    pub fn with_names(mut self, names: Vec<String>) -> YoloTreeResult<Self> {
        if names.len() != self.tree.len() {
            return Err(YoloTreeError::ShapeMismatch {
                expected: self.tree.len(),
                got: names.len(),
                context: "class names",
            });
        }
        self.names = Some(names);
        Ok(self)
    }

    /// Label tree in use.
    pub fn tree(&self) -> &LabelTree {
        &self.tree
    }

    /// Anchor table in use.
    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Current configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Box decoder bound to this detector's tree and anchors.
    pub fn decoder(&self) -> BoxDecoder<'_> {
        BoxDecoder::new(&self.tree, &self.anchors)
    }

    /// Display label for `node`.
    pub fn label(&self, node: usize) -> Option<&str> {
        match &self.names {
            Some(names) => names.get(node).map(String::as_str),
            None => self.tree.id(node),
        }
    }

    /// Runs decode, filter and suppression for batch entry `b`.
    pub fn detect_image(
        &self,
        tensor: TensorView<'_>,
        b: usize,
        image_height: usize,
        image_width: usize,
    ) -> YoloTreeResult<Vec<Detection>> {
        self.cfg.validate()?;
        let filter_params = FilterParams {
            score_threshold: self.cfg.score_threshold,
            image_height,
            image_width,
        };
        validate_params(&filter_params)?;
        let _span = trace_span!("detect_image", batch = b).entered();

        let decoder = self.decoder();
        let candidates = if self.cfg.parallel {
            self.decode_and_filter_par(&decoder, tensor, b, filter_params)?
        } else {
            let decoded = decoder.decode_image(tensor, b)?;
            filter_boxes(decoded, &self.tree, filter_params)?
        };

        let kept = nms_boxes(
            &candidates,
            SuppressParams {
                max_boxes: self.cfg.max_boxes,
                score_threshold: self.cfg.score_threshold,
                iou_threshold: self.cfg.iou_threshold,
            },
        );

        Ok(kept
            .into_iter()
            .map(|c| Detection {
                bbox: c.bbox,
                score: c.score,
                class: c.node,
                label: self.label(c.node).unwrap_or_default().to_owned(),
            })
            .collect())
    }

    /// Runs [`Detector::detect_image`] for every batch entry, all of the same
    /// image size.
    pub fn detect_batch(
        &self,
        tensor: TensorView<'_>,
        image_height: usize,
        image_width: usize,
    ) -> YoloTreeResult<Vec<Vec<Detection>>> {
        (0..tensor.batch())
            .map(|b| self.detect_image(tensor, b, image_height, image_width))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn decode_and_filter_par(
        &self,
        decoder: &BoxDecoder<'_>,
        tensor: TensorView<'_>,
        b: usize,
        params: FilterParams,
    ) -> YoloTreeResult<Vec<crate::candidate::Candidate>> {
        let decoded = decoder.decode_image_par(tensor, b)?;
        crate::filter::filter_boxes_par(decoded, &self.tree, params)
    }

    #[cfg(not(feature = "rayon"))]
    fn decode_and_filter_par(
        &self,
        _decoder: &BoxDecoder<'_>,
        _tensor: TensorView<'_>,
        _b: usize,
        _params: FilterParams,
    ) -> YoloTreeResult<Vec<crate::candidate::Candidate>> {
        Err(YoloTreeError::InvalidInput(
            "parallel detection requires the `rayon` feature",
        ))
    }
}
