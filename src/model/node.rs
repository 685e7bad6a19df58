//! The document tree.
//!
//! A document is a [`Node`], with children that are also nodes. Nodes come
//! in two shapes: text nodes, which carry a string and marks, and composite
//! block nodes, which carry attributes, marks and a [`Fragment`] of
//! children. Both reference their [`NodeType`].

use super::{
    replace, util, Attrs, ContentCheckError, Fragment, Mark, NodeType, ReplaceError, ResolveErr,
    ResolvedPos, Slice,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::ops::RangeBounds;

/// A string that caches its length in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Text {
    len_utf16: usize,
    content: String,
}

impl Text {
    /// Return the contained string.
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// The length of this string in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    /// Concatenate two texts.
    pub fn join(&self, other: &Text) -> Text {
        Text {
            len_utf16: self.len_utf16 + other.len_utf16,
            content: format!("{}{}", self.content, other.content),
        }
    }
}

impl From<String> for Text {
    fn from(src: String) -> Text {
        Text {
            len_utf16: util::utf16_len(&src),
            content: src,
        }
    }
}

impl From<&str> for Text {
    fn from(src: &str) -> Text {
        Text::from(src.to_owned())
    }
}

impl Serialize for Text {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.content.serialize(serializer)
    }
}

/// A text node: a run of text with a set of marks.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// The text type of the schema this node belongs to.
    pub r#type: NodeType,
    /// The marks applied to this text.
    pub marks: Vec<Mark>,
    /// The text itself.
    pub text: Text,
}

impl TextNode {
    /// When `other` is a text node with the same marks, return it.
    pub fn same_markup<'o>(&self, other: &'o Node) -> Option<&'o TextNode> {
        match other {
            Node::Text(other) if other.marks == self.marks => Some(other),
            _ => None,
        }
    }

    /// Create a new `TextNode` with the given text and this node's markup.
    pub fn with_text(&self, text: Text) -> TextNode {
        TextNode {
            r#type: self.r#type.clone(),
            marks: self.marks.clone(),
            text,
        }
    }
}

/// A composite node: attributes, marks, and a fragment of children.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    /// The type of this node.
    pub r#type: NodeType,
    /// The attributes of this node.
    pub attrs: Attrs,
    /// The marks applied to this node.
    pub marks: Vec<Mark>,
    /// The children of this node.
    pub content: Fragment,
}

/// A node in the tree that makes up a document.
///
/// Nodes are persistent values: all the methods below leave `self` intact
/// and return new nodes where something changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A text node.
    Text(TextNode),
    /// A composite node.
    Block(BlockNode),
}

impl Node {
    /// Create a composite node.
    pub fn block(r#type: NodeType, attrs: Attrs, marks: Vec<Mark>, content: Fragment) -> Node {
        Node::Block(BlockNode {
            r#type,
            attrs,
            marks,
            content,
        })
    }

    /// Create a text node. The type must be the schema's text type.
    pub fn text_of(r#type: NodeType, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        Node::Text(TextNode {
            r#type,
            marks,
            text: Text::from(text.into()),
        })
    }

    /// The type of this node.
    pub fn r#type(&self) -> &NodeType {
        match self {
            Node::Text(t) => &t.r#type,
            Node::Block(b) => &b.r#type,
        }
    }

    /// The marks applied to this node.
    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Text(t) => &t.marks,
            Node::Block(b) => &b.marks,
        }
    }

    /// The attributes of this node; text nodes have none.
    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Text(_) => None,
            Node::Block(b) => Some(&b.attrs),
        }
    }

    /// The text and marks, if this is a text node.
    pub fn text_node(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Block(_) => None,
        }
    }

    /// The fragment holding this node's children; empty for text nodes and
    /// leaves.
    pub fn content(&self) -> &Fragment {
        match self {
            Node::Text(_) => Fragment::EMPTY_REF,
            Node::Block(b) => &b.content,
        }
    }

    /// Shorthand for the size of this node's content.
    pub fn content_size(&self) -> usize {
        self.content().size()
    }

    /// Get the child node at the given index. Panics when the index is out
    /// of range.
    pub fn child(&self, index: usize) -> &Node {
        self.content().child(index)
    }

    /// Get the child node at the given index, if it exists.
    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content().maybe_child(index)
    }

    /// The first child of this node, if any.
    pub fn first_child(&self) -> Option<&Node> {
        self.content().first_child()
    }

    /// The number of children this node has.
    pub fn child_count(&self) -> usize {
        self.content().child_count()
    }

    /// True when this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// True when this node's type has no content expression.
    pub fn is_leaf(&self) -> bool {
        self.r#type().is_leaf()
    }

    /// True when this node is counted as a single unit by traversals.
    pub fn is_atom(&self) -> bool {
        self.r#type().is_atom()
    }

    /// True when this is a block (non-inline) node.
    pub fn is_block(&self) -> bool {
        self.r#type().is_block()
    }

    /// True when this is an inline node.
    pub fn is_inline(&self) -> bool {
        self.r#type().is_inline()
    }

    /// The size of this node, as defined by the integer-based indexing
    /// scheme: the UTF-16 length for text nodes, one for other leaf nodes,
    /// and the size of the content plus two (the start and end boundary)
    /// for the rest.
    pub fn node_size(&self) -> usize {
        match self {
            Node::Text(t) => t.text.len_utf16(),
            Node::Block(_) if self.r#type().is_leaf() => 1,
            Node::Block(b) => 2 + b.content.size(),
        }
    }

    /// Create a new node with the same markup as this node, containing the
    /// content produced by the mapping function (text nodes are returned
    /// unchanged).
    pub fn copy<F>(&self, map: F) -> Node
    where
        F: FnOnce(&Fragment) -> Fragment,
    {
        match self {
            Node::Text(t) => Node::Text(t.clone()),
            Node::Block(b) => Node::Block(BlockNode {
                r#type: b.r#type.clone(),
                attrs: b.attrs.clone(),
                marks: b.marks.clone(),
                content: map(&b.content),
            }),
        }
    }

    /// A copy of this node carrying the given marks.
    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        let mut node = self.clone();
        match &mut node {
            Node::Text(t) => t.marks = marks,
            Node::Block(b) => b.marks = marks,
        }
        node
    }

    /// True when this node has the given type, attributes and marks.
    pub fn has_markup(&self, r#type: &NodeType, attrs: Option<&Attrs>, marks: &[Mark]) -> bool {
        self.r#type() == r#type
            && self.attrs().unwrap_or(&Attrs::new()) == attrs.unwrap_or(&Attrs::new())
            && self.marks() == marks
    }

    /// True when this node's markup equals the other node's.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.r#type(), other.attrs(), other.marks())
    }

    /// Create a copy of this node with only the content between the given
    /// positions; text nodes are sliced by UTF-16 code units.
    pub fn cut<R: RangeBounds<usize>>(&self, range: R) -> Cow<Node> {
        match self {
            Node::Text(t) => {
                let len = t.text.len_utf16();
                let (from, to) = util::bounds(&range, len);
                if from == 0 && to == len {
                    return Cow::Borrowed(self);
                }
                let (_, rest) = util::split_at_utf16(t.text.as_str(), from);
                let (kept, _) = util::split_at_utf16(rest, to - from);
                Cow::Owned(Node::Text(t.with_text(Text::from(kept))))
            }
            Node::Block(b) => {
                let size = b.content.size();
                let (from, to) = util::bounds(&range, size);
                if from == 0 && to == size {
                    Cow::Borrowed(self)
                } else {
                    Cow::Owned(self.copy(|c| c.cut(from..to)))
                }
            }
        }
    }

    /// Replace this node's content after validating the new fragment
    /// against the node type.
    pub fn close(&self, content: Fragment) -> Result<Node, ContentCheckError> {
        self.r#type().check_content(&content)?;
        Ok(self.copy(|_| content))
    }

    /// The content match after threading this node's first `index` children
    /// through the type's automaton, or `None` when they don't match.
    pub fn content_match_at(&self, index: usize) -> Option<super::ContentMatch> {
        self.r#type()
            .content_match()
            .match_fragment_range(self.content(), ..index)
    }

    /// Test whether replacing the children between the `from` and `to`
    /// indices with the given range of the replacement fragment would leave
    /// the node's content valid.
    pub fn can_replace<R: RangeBounds<usize>>(
        &self,
        from: usize,
        to: usize,
        replacement: &Fragment,
        range: R,
    ) -> bool {
        let (start, end) = util::bounds(&range, replacement.child_count());

        let one = match self.content_match_at(from) {
            Some(m) => m,
            None => return false,
        };
        let one = match one.match_fragment_range(replacement, start..end) {
            Some(m) => m,
            None => return false,
        };
        let two = match one.match_fragment_range(self.content(), to..) {
            Some(m) => m,
            None => return false,
        };
        if !two.valid_end() {
            return false;
        }
        for i in start..end {
            if self.r#type().check_marks(replacement.child(i).marks()).is_err() {
                return false;
            }
        }
        true
    }

    /// Resolve the given position in this document, returning a struct with
    /// information about its context.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, ResolveErr> {
        ResolvedPos::resolve(self, pos)
    }

    /// Cut out the part of the document between the given positions and
    /// return it as a [`Slice`].
    pub fn slice<R: RangeBounds<usize>>(
        &self,
        range: R,
        include_parents: bool,
    ) -> Result<Slice, ResolveErr> {
        let (from, to) = util::bounds(&range, self.content().size());
        if from == to {
            return Ok(Slice::default());
        }

        let rp_from = self.resolve(from)?;
        let rp_to = self.resolve(to)?;

        let depth = if include_parents {
            0
        } else {
            rp_from.shared_depth(to)
        };
        let start = rp_from.start(depth);
        let node = rp_from.node(depth);
        let content = node.content().cut(from - start..to - start);
        Ok(Slice::new(
            content,
            rp_from.depth() - depth,
            rp_to.depth() - depth,
        ))
    }

    /// Replace the part of the document between the given positions with
    /// the given slice, returning the new document.
    pub fn replace<R: RangeBounds<usize>>(
        &self,
        range: R,
        slice: &Slice,
    ) -> Result<Node, ReplaceError> {
        let (from, to) = util::bounds(&range, self.content().size());
        let rp_from = self.resolve(from)?;
        let rp_to = self.resolve(to)?;
        replace::replace(&rp_from, &rp_to, slice)
    }

    /// Invoke a callback for all descendant nodes between the given
    /// positions. The callback receives the node, its position, its parent
    /// and its index; returning `false` prevents descending into the node.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.content().nodes_between(from, to, f, 0, self)
    }

    /// Call the given callback for every descendant node.
    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between(0, self.content().size(), f)
    }

    /// Concatenate all the text found in this node and its children.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.as_str().to_owned(),
            Node::Block(b) => {
                let mut buf = String::new();
                b.content
                    .text_between(&mut buf, true, 0, b.content.size(), Some(""), None, self);
                buf
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.r#type().name())?;
        if let Some(attrs) = self.attrs() {
            if !attrs.is_empty() {
                map.serialize_entry("attrs", attrs)?;
            }
        }
        if !self.marks().is_empty() {
            map.serialize_entry("marks", self.marks())?;
        }
        match self {
            Node::Text(t) => map.serialize_entry("text", t.text.as_str())?,
            Node::Block(b) => {
                if !b.content.is_empty() {
                    map.serialize_entry("content", &b.content)?;
                }
            }
        }
        map.end()
    }
}
