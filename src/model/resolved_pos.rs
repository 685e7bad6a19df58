//! Resolved positions: an integer position turned into a traversal path.

use super::{IndexError, Node};
use derive_new::new;
use displaydoc::Display;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Errors from [`ResolvedPos::resolve`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Error)]
pub enum ResolveErr {
    /// position {pos} out of range
    RangeError {
        /// The position that was out of range
        pos: usize,
    },
    /// index error
    Index(#[from] IndexError),
}

/// A node in the resolution path.
#[derive(Clone, PartialEq, new)]
pub struct ResolvedNode<'a> {
    /// The ancestor node at this depth.
    pub node: &'a Node,
    /// The index taken into that node's children.
    pub index: usize,
    /// The absolute position at which this depth was entered.
    pub before: usize,
}

impl<'a> fmt::Debug for ResolvedNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNode")
            .field("node.type", self.node.r#type())
            .field("index", &self.index)
            .field("before", &self.before)
            .finish()
    }
}

/// You can resolve a position to get more information about it: the chain
/// of ancestors containing it, the index and offset at each depth, and
/// helpers for the nodes around the position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPos<'a> {
    pub(crate) pos: usize,
    path: Vec<ResolvedNode<'a>>,
    pub(crate) parent_offset: usize,
    pub(crate) depth: usize,
}

impl<'a> ResolvedPos<'a> {
    pub(crate) fn new(pos: usize, path: Vec<ResolvedNode<'a>>, parent_offset: usize) -> Self {
        Self {
            depth: path.len() - 1,
            pos,
            path,
            parent_offset,
        }
    }

    /// The position that was resolved.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The depth of the parent node: `0` means the position points directly
    /// into the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The position relative to the start of the parent node.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The parent node that the position points into. Note that even if a
    /// position points into a text node, that node is not considered the
    /// parent—text nodes are ‘flat’ in this model, and have no content.
    pub fn parent(&self) -> &'a Node {
        self.node(self.depth)
    }

    /// The root node in which the position was resolved.
    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    /// The ancestor node at the given depth. `p.node(p.depth())` is the
    /// same as `p.parent()`.
    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    /// The index into the ancestor at the given depth. If this points at
    /// the 3rd node in the 2nd paragraph on the top level, for example,
    /// `p.index(0)` is 1 and `p.index(1)` is 2.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// The index pointing after this position into the ancestor at the
    /// given depth.
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// The (absolute) position at the start of the node at the given depth.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].before + 1
        }
    }

    /// The (absolute) position at the end of the node at the given depth.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// The (absolute) position directly before the wrapping node at the
    /// given depth, or, when depth is `self.depth() + 1`, the original
    /// position. Depth 0 has no wrapping node.
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else if depth == self.depth + 1 {
            Some(self.pos)
        } else {
            Some(self.path[depth - 1].before)
        }
    }

    /// The (absolute) position directly after the wrapping node at the
    /// given depth, or the original position when depth is
    /// `self.depth() + 1`.
    pub fn after(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else if depth == self.depth + 1 {
            Some(self.pos)
        } else {
            Some(self.path[depth - 1].before + self.path[depth].node.node_size())
        }
    }

    /// When this position points into a text node, the distance between the
    /// position and the start of the text node. Zero for positions that
    /// point between nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path.last().expect("path is never empty").before
    }

    /// Get the node directly before the position, if any. If the position
    /// points into a text node, only the part of that node before the
    /// position is returned.
    pub fn node_before(&self) -> Option<Cow<'a, Node>> {
        let index = self.index(self.depth);
        let d_off = self.text_offset();
        if d_off > 0 {
            let child = self.parent().child(index);
            Some(child.cut(0..d_off))
        } else if index == 0 {
            None
        } else {
            Some(Cow::Borrowed(self.parent().child(index - 1)))
        }
    }

    /// Get the node directly after the position, if any. If the position
    /// points into a text node, only the part of that node after the
    /// position is returned.
    pub fn node_after(&self) -> Option<Cow<'a, Node>> {
        let parent = self.parent();
        let index = self.index(self.depth);
        if index == parent.child_count() {
            return None;
        }
        let d_off = self.text_offset();
        let child = parent.child(index);
        if d_off > 0 {
            Some(child.cut(d_off..))
        } else {
            Some(Cow::Borrowed(child))
        }
    }

    /// The greatest depth at which the node containing this position also
    /// contains the given (unresolved) position; `0` when only the root
    /// does.
    pub fn shared_depth(&self, pos: usize) -> usize {
        for depth in (1..=self.depth).rev() {
            if self.start(depth) <= pos && self.end(depth) >= pos {
                return depth;
            }
        }
        0
    }

    /// Resolve a position within the document.
    pub fn resolve(doc: &'a Node, pos: usize) -> Result<Self, ResolveErr> {
        if pos > doc.content().size() {
            return Err(ResolveErr::RangeError { pos });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc;

        loop {
            let index = node.content().find_index(parent_offset)?;
            let rem = parent_offset - index.offset;
            path.push(ResolvedNode {
                node,
                index: index.index,
                before: start + index.offset,
            });
            if rem == 0 {
                break;
            }
            node = node.child(index.index);
            if node.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += index.offset + 1;
        }
        Ok(ResolvedPos::new(pos, path, parent_offset))
    }
}
