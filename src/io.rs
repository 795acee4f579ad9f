//! Loading the static model assets from disk.
//!
//! Read failures surface as `Config` errors; a readable but malformed tree
//! file surfaces as `TreeParse`.

use crate::decode::AnchorTable;
use crate::detect::Detector;
use crate::tree::LabelTree;
use crate::util::{YoloTreeError, YoloTreeResult};
use std::fs;
use std::path::Path;

fn read_text(path: &Path, what: &str) -> YoloTreeResult<String> {
    fs::read_to_string(path).map_err(|err| {
        YoloTreeError::config(format!("cannot read {what} {}: {err}", path.display()))
    })
}

/// Loads a label tree file (`"<id> <father>"` per line).
pub fn load_tree<P: AsRef<Path>>(path: P) -> YoloTreeResult<LabelTree> {
    LabelTree::parse(&read_text(path.as_ref(), "tree file")?)
}

/// Loads an anchor file of comma-separated `(width, height)` values.
pub fn load_anchors<P: AsRef<Path>>(path: P) -> YoloTreeResult<AnchorTable> {
    AnchorTable::parse(&read_text(path.as_ref(), "anchor file")?)
}

/// Loads class names, one per line. Trailing blank lines are ignored.
pub fn load_names<P: AsRef<Path>>(path: P) -> YoloTreeResult<Vec<String>> {
    let text = read_text(path.as_ref(), "names file")?;
    let mut names: Vec<String> = text.lines().map(|l| l.trim().to_owned()).collect();
    while names.last().is_some_and(|n| n.is_empty()) {
        names.pop();
    }
    Ok(names)
}

/// Loads tree, anchors and optional names and assembles a [`Detector`].
pub fn load_detector<P, Q, R>(
    tree_path: P,
    anchors_path: Q,
    names_path: Option<R>,
) -> YoloTreeResult<Detector>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let tree = load_tree(tree_path)?;
    let anchors = load_anchors(anchors_path)?;
    let detector = Detector::new(tree, anchors);
    match names_path {
        Some(path) => detector.with_names(load_names(path)?),
        None => Ok(detector),
    }
}
