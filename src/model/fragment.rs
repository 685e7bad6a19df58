//! Fragments: the child sequences of nodes, with a cached total size.

use super::{util, Node};
use derive_new::new;
use displaydoc::Display;
use serde::{Serialize, Serializer};
use std::ops::RangeBounds;
use thiserror::Error;

/// The error returned by [`Fragment::find_index`] for positions past the
/// end of the fragment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Error)]
pub enum IndexError {
    /// position {0} outside of fragment
    OutOfBounds(usize),
}

/// The index of a child within a fragment, together with the position at
/// which that child starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, new)]
pub struct Index {
    /// The child index.
    pub index: usize,
    /// The start offset of the child at `index`.
    pub offset: usize,
}

/// A fragment represents a node's collection of child nodes.
///
/// Like nodes, fragments are persistent data structures: you never mutate
/// them, you create new instances whenever needed. The cached size is the
/// sum of the sizes of the children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    inner: Vec<Node>,
    size: usize,
}

impl Fragment {
    /// An empty fragment.
    pub const EMPTY: Self = Fragment {
        inner: Vec::new(),
        size: 0,
    };
    /// Reference to an empty fragment.
    pub const EMPTY_REF: &'static Self = &Self::EMPTY;

    /// Create a new empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// The size of the fragment, which is the total of the size of its
    /// content nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// True when the fragment has no children.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get a slice of all child nodes.
    pub fn children(&self) -> &[Node] {
        &self.inner
    }

    /// The first child of the fragment, or `None` if it is empty.
    pub fn first_child(&self) -> Option<&Node> {
        self.inner.first()
    }

    /// The last child of the fragment, or `None` if it is empty.
    pub fn last_child(&self) -> Option<&Node> {
        self.inner.last()
    }

    /// The number of child nodes in this fragment.
    pub fn child_count(&self) -> usize {
        self.inner.len()
    }

    /// Get the child node at the given index. Panics when the index is out
    /// of range.
    pub fn child(&self, index: usize) -> &Node {
        &self.inner[index]
    }

    /// Get the child node at the given index, if it exists.
    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.inner.get(index)
    }

    /// Create a new fragment containing the combined content of this
    /// fragment and the other. Adjacent text nodes with identical markup are
    /// joined at the seam.
    pub fn append(mut self, mut other: Self) -> Self {
        if other.size == 0 {
            return self;
        }
        if self.size == 0 {
            return other;
        }

        let size = self.size + other.size;
        let joins = match (self.inner.last(), other.inner.first()) {
            (Some(Node::Text(last)), Some(first)) => last.same_markup(first).is_some(),
            _ => false,
        };
        if joins {
            let first = other.inner.remove(0);
            let last = self.inner.last_mut().expect("joins implies a last child");
            if let (Node::Text(l), Node::Text(f)) = (&*last, &first) {
                let joined = Node::Text(l.with_text(l.text.join(&f.text)));
                *last = joined;
            }
        }
        self.inner.append(&mut other.inner);
        self.size = size;
        self
    }

    /// Cut out the sub-fragment between the two given positions.
    pub fn cut<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let (from, to) = util::bounds(&range, self.size);

        if from == 0 && to == self.size {
            return self.clone();
        }

        let mut result = Vec::new();
        let mut size = 0;
        if to > from {
            let mut pos = 0;
            let mut i = 0;
            while pos < to {
                let child = &self.inner[i];
                let end = pos + child.node_size();
                if end > from {
                    let new_child = if pos < from || end > to {
                        if let Node::Text(text) = child {
                            let len = text.text.len_utf16();
                            let start = from.saturating_sub(pos);
                            let end = usize::min(len, to - pos);
                            child.cut(start..end)
                        } else {
                            // deduct one unit for the child's opening boundary
                            let inner_start = pos + 1;
                            let start = from.saturating_sub(inner_start);
                            let end = usize::min(child.content().size(), to - inner_start);
                            child.cut(start..end)
                        }
                        .into_owned()
                    } else {
                        child.clone()
                    };
                    size += new_child.node_size();
                    result.push(new_child);
                }
                pos = end;
                i += 1;
            }
        }
        Fragment {
            inner: result,
            size,
        }
    }

    /// Create a new fragment in which the node at the given index is
    /// replaced by the given node.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let current = &self.inner[index];
        if *current == node {
            return self.clone();
        }
        let size = self.size + node.node_size() - current.node_size();
        let mut inner = self.inner.clone();
        inner[index] = node;
        Fragment { inner, size }
    }

    /// Invoke a callback for all descendant nodes between the given two
    /// positions (relative to the start of this fragment), passing the node,
    /// its document position, its parent and its index. Doesn't descend into
    /// a node when the callback returns `false`.
    pub fn nodes_between<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: &Node,
    ) where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.inner.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content().size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    usize::min(child.content().size(), to - start),
                    f,
                    node_start + start,
                    child,
                );
            }
            pos = end;
        }
    }

    /// Get all text between positions `from` and `to`. When
    /// `block_separator` is given, it is inserted whenever a new block node
    /// is started. When `leaf_text` is given, it is inserted for every
    /// non-text leaf node encountered.
    pub fn text_between(
        &self,
        text: &mut String,
        mut separated: bool,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: Option<&str>,
        parent: &Node,
    ) {
        self.nodes_between(
            from,
            to,
            &mut |node, pos, _parent, _index| {
                if let Node::Text(txt_node) = node {
                    let txt = txt_node.text.as_str();
                    let (rest, skip) = if from > pos {
                        let skip = from - pos;
                        (util::split_at_utf16(txt, skip).1, skip)
                    } else {
                        (txt, 0)
                    };
                    let end = usize::min(to - pos, txt_node.text.len_utf16());
                    let slice = util::split_at_utf16(rest, end - skip).0;
                    text.push_str(slice);
                    separated = block_separator.is_none();
                } else if node.is_leaf() {
                    if let Some(leaf_text) = leaf_text {
                        text.push_str(leaf_text);
                    }
                    separated = block_separator.is_none();
                } else if !separated && node.is_block() {
                    text.push_str(block_separator.unwrap_or(""));
                    separated = true;
                }
                true
            },
            0,
            parent,
        )
    }

    /// Find the child covering the given position.
    ///
    /// A position on the boundary between two children resolves to the index
    /// after the boundary.
    pub fn find_index(&self, pos: usize) -> Result<Index, IndexError> {
        match pos {
            0 => Ok(Index::new(0, 0)),
            p if p == self.size => Ok(Index::new(self.inner.len(), p)),
            p if p > self.size => Err(IndexError::OutOfBounds(p)),
            p => {
                let mut cur_pos = 0;
                for (i, cur) in self.inner.iter().enumerate() {
                    let end = cur_pos + cur.node_size();
                    if end >= p {
                        if end == p {
                            return Ok(Index::new(i + 1, end));
                        }
                        return Ok(Index::new(i, cur_pos));
                    }
                    cur_pos = end;
                }
                panic!("Invariant failed: self.size must be the sum of all node sizes")
            }
        }
    }
}

impl Serialize for Fragment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner.serialize(serializer)
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(src: Vec<Node>) -> Fragment {
        let size = src.iter().map(Node::node_size).sum();
        Fragment { inner: src, size }
    }
}

impl From<Fragment> for Vec<Node> {
    fn from(src: Fragment) -> Vec<Node> {
        src.inner
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Fragment {
        Fragment::from(vec![node])
    }
}
