//! Incremental construction of a [`LabelTree`] from `(id, father)` entries.
//!
//! The builder is a small state machine: it tracks the father of the run
//! currently being read and where that run started. A change of father closes
//! the run as an immutable [`Group`] and opens the next one.

use crate::tree::{Group, LabelTree, Node};
use crate::util::{YoloTreeError, YoloTreeResult};

/// Father value of a run of siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Parent {
    Root,
    Node(usize),
}

/// Streaming builder for [`LabelTree`].
///
/// Entries must arrive in tree-file order: parents before children and all
/// siblings of one father contiguous.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    groups: Vec<Group>,
    current_father: Option<Parent>,
    current_group_start: usize,
    root_closed: bool,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes pushed so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been pushed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends one node. `line` is only used for error reporting.
    pub fn push(&mut self, line: usize, id: &str, father: i64) -> YoloTreeResult<()> {
        let index = self.nodes.len();
        let parent = match father {
            -1 => Parent::Root,
            f if f < -1 => {
                return Err(YoloTreeError::tree_parse(
                    line,
                    format!("invalid father index {f}"),
                ));
            }
            f => {
                let f = usize::try_from(f).map_err(|_| {
                    YoloTreeError::tree_parse(line, format!("father index {f} out of range"))
                })?;
                if f >= index {
                    return Err(YoloTreeError::tree_parse(
                        line,
                        format!("father index {f} not yet introduced (node {index})"),
                    ));
                }
                Parent::Node(f)
            }
        };

        if self.current_father != Some(parent) {
            self.close_group();
            self.open_group(line, parent)?;
        }

        self.nodes.push(Node {
            id: id.to_owned(),
            father: match parent {
                Parent::Root => None,
                Parent::Node(f) => Some(f),
            },
            child_group: None,
        });
        Ok(())
    }

    /// Closes the final group and returns the finished tree.
    pub fn finish(mut self) -> YoloTreeResult<LabelTree> {
        if self.nodes.is_empty() {
            return Err(YoloTreeError::tree_parse(0, "tree has no nodes"));
        }
        self.close_group();
        Ok(LabelTree {
            nodes: self.nodes,
            groups: self.groups,
        })
    }

    fn close_group(&mut self) {
        if self.current_father.is_none() {
            return;
        }
        let count = self.nodes.len();
        self.groups.push(Group {
            offset: self.current_group_start,
            size: count - self.current_group_start,
        });
        if self.current_father == Some(Parent::Root) {
            self.root_closed = true;
        }
    }

    fn open_group(&mut self, line: usize, parent: Parent) -> YoloTreeResult<()> {
        let group_id = self.groups.len();
        match parent {
            Parent::Root => {
                if self.root_closed {
                    return Err(YoloTreeError::tree_parse(
                        line,
                        "root nodes are not contiguous",
                    ));
                }
            }
            Parent::Node(f) => {
                let node = &mut self.nodes[f];
                if node.child_group.is_some() {
                    return Err(YoloTreeError::tree_parse(
                        line,
                        format!("children of node {f} are not contiguous"),
                    ));
                }
                node.child_group = Some(group_id);
            }
        }
        self.current_father = Some(parent);
        self.current_group_start = self.nodes.len();
        Ok(())
    }
}

/// Parses one `"<id> <father>"` line.
pub(crate) fn parse_line(line_no: usize, line: &str) -> YoloTreeResult<(&str, i64)> {
    let mut fields = line.split_whitespace();
    let (id, father) = match (fields.next(), fields.next(), fields.next()) {
        (Some(id), Some(father), None) => (id, father),
        _ => {
            return Err(YoloTreeError::tree_parse(
                line_no,
                format!("expected \"<id> <father>\", got {line:?}"),
            ));
        }
    };
    let father = father.parse::<i64>().map_err(|_| {
        YoloTreeError::tree_parse(line_no, format!("father index {father:?} is not an integer"))
    })?;
    Ok((id, father))
}
