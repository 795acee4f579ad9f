//! Hierarchical label taxonomy ("label tree").
//!
//! Each non-leaf node owns one group of children that share a softmax. Nodes
//! are stored in file order, so every father precedes its children and every
//! group is a contiguous run `[offset, offset + size)` of the node array.
//! Groups partition the node array without gaps or overlap; group 0 holds
//! the root nodes.

mod parse;

pub use parse::TreeBuilder;

use crate::util::{YoloTreeError, YoloTreeResult};

/// Contiguous run of sibling nodes normalized by one softmax.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    offset: usize,
    size: usize,
}

impl Group {
    /// Index of the first node in the group.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of nodes in the group.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Node index range covered by the group.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) id: String,
    pub(crate) father: Option<usize>,
    pub(crate) child_group: Option<usize>,
}

/// Node chosen by [`LabelTree::predict_top_down`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    /// Index of the predicted node.
    pub node: usize,
    /// Absolute (combined) probability of that node.
    pub prob: f32,
}

/// Immutable label tree.
#[derive(Clone, Debug)]
pub struct LabelTree {
    nodes: Vec<Node>,
    groups: Vec<Group>,
}

impl LabelTree {
    /// Builds a tree from `(id, father)` entries in file order (`-1` = root).
    ///
    /// Entry numbers in errors are 1-based positions in the sequence.
    pub fn from_entries<I, S>(entries: I) -> YoloTreeResult<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut builder = TreeBuilder::new();
        for (idx, (id, father)) in entries.into_iter().enumerate() {
            builder.push(idx + 1, id.as_ref(), father)?;
        }
        builder.finish()
    }

    /// Parses the text tree format: one `"<id> <father>"` line per node.
    ///
    /// Blank lines are skipped; line numbers in errors refer to the input.
    pub fn parse(text: &str) -> YoloTreeResult<Self> {
        let mut builder = TreeBuilder::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (id, father) = parse::parse_line(idx + 1, line)?;
            builder.push(idx + 1, id, father)?;
        }
        builder.finish()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed tree; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sibling groups in node order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns group `index`, if any.
    pub fn group(&self, index: usize) -> Option<Group> {
        self.groups.get(index).copied()
    }

    /// Father of `node`, or `None` for a root node or an out-of-range index.
    pub fn father(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).and_then(|n| n.father)
    }

    /// Group formed by the children of `node`, or `None` for a leaf.
    pub fn child_group(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).and_then(|n| n.child_group)
    }

    /// Returns true if `node` has no children.
    pub fn is_leaf(&self, node: usize) -> bool {
        self.child_group(node).is_none()
    }

    /// External id string of `node` (e.g. a WordNet synset).
    pub fn id(&self, node: usize) -> Option<&str> {
        self.nodes.get(node).map(|n| n.id.as_str())
    }

    /// Iterates `node`, its father, and so on up to a root.
    pub fn ancestors(&self, node: usize) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: (node < self.len()).then_some(node),
        }
    }

    /// Number of edges between `node` and its root.
    pub fn depth(&self, node: usize) -> usize {
        self.ancestors(node).count().saturating_sub(1)
    }

    /// Converts conditional probabilities to absolute ones in place.
    ///
    /// Nodes are visited in increasing index order; since every father
    /// precedes its children, the father's value is already absolute when a
    /// child is multiplied by it.
    pub fn propagate_absolute(&self, probs: &mut [f32]) -> YoloTreeResult<()> {
        self.check_len(probs.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(f) = node.father {
                probs[i] *= probs[f];
            }
        }
        Ok(())
    }

    /// Absolute probability of a single node from conditional probabilities.
    pub fn absolute_prob(&self, cond_probs: &[f32], node: usize) -> YoloTreeResult<f32> {
        self.check_len(cond_probs.len())?;
        if node >= self.len() {
            return Err(YoloTreeError::IndexOutOfBounds {
                index: node,
                len: self.len(),
                context: "node",
            });
        }
        Ok(self.ancestors(node).map(|i| cond_probs[i]).product())
    }

    /// Walks the tree from the root group, descending into the best child
    /// while it scores at least `threshold`.
    ///
    /// Returns the last accepted node, or `None` when the root group's best
    /// node is already below `threshold`. Ties go to the lowest index. A
    /// failed group ends the walk; alternative branches are not explored.
    pub fn predict_top_down(
        &self,
        abs_probs: &[f32],
        threshold: f32,
    ) -> YoloTreeResult<Option<Prediction>> {
        self.check_len(abs_probs.len())?;
        let mut accepted = None;
        let mut group = 0usize;
        loop {
            let range = self.groups[group].range();
            let mut best = range.start;
            let mut best_prob = abs_probs[best];
            for i in range {
                if abs_probs[i] > best_prob {
                    best = i;
                    best_prob = abs_probs[i];
                }
            }
            if best_prob.is_nan() || best_prob < threshold {
                return Ok(accepted);
            }
            let pred = Prediction {
                node: best,
                prob: best_prob,
            };
            match self.nodes[best].child_group {
                None => return Ok(Some(pred)),
                Some(child) => {
                    accepted = Some(pred);
                    group = child;
                }
            }
        }
    }

    fn check_len(&self, got: usize) -> YoloTreeResult<()> {
        if got != self.len() {
            return Err(YoloTreeError::ShapeMismatch {
                expected: self.len(),
                got,
                context: "class probabilities",
            });
        }
        Ok(())
    }
}

/// Iterator over a node and its ancestors, see [`LabelTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a LabelTree,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.father(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelTree, Prediction};

    fn small_tree() -> LabelTree {
        LabelTree::parse("node0 -1\nnode1 0\nnode2 0\n").unwrap()
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = LabelTree::parse("a -1\nb 0\nc 0\nd 1\ne 3\n").unwrap();
        assert_eq!(tree.ancestors(4).collect::<Vec<_>>(), vec![4, 3, 1, 0]);
        assert_eq!(tree.depth(4), 3);
        assert_eq!(tree.depth(0), 0);
        assert_eq!(tree.ancestors(99).count(), 0);
    }

    #[test]
    fn absolute_prob_matches_propagation() {
        let tree = small_tree();
        let cond = [0.9f32, 0.6, 0.4];
        let mut abs = cond;
        tree.propagate_absolute(&mut abs).unwrap();
        for node in 0..tree.len() {
            let single = tree.absolute_prob(&cond, node).unwrap();
            assert!((single - abs[node]).abs() < 1e-6);
        }
        assert!(tree.absolute_prob(&cond, 3).is_err());
    }

    #[test]
    fn predict_prefers_lowest_index_on_tie() {
        let tree = small_tree();
        let pred = tree.predict_top_down(&[0.9, 0.5, 0.5], 0.1).unwrap();
        assert_eq!(pred, Some(Prediction { node: 1, prob: 0.5 }));
    }

    #[test]
    fn predict_rejects_nan_scores() {
        let tree = small_tree();
        assert_eq!(tree.predict_top_down(&[f32::NAN, 0.5, 0.5], 0.1).unwrap(), None);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let tree = small_tree();
        let mut probs = [0.5f32; 2];
        assert!(tree.propagate_absolute(&mut probs).is_err());
        assert!(tree.predict_top_down(&probs, 0.1).is_err());
    }
}
