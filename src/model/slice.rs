//! Slices: open-ended fragments cut out of a document.

use super::{Fragment, IndexError, Node};
use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

/// Errors from [`Slice::insert_at`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Error)]
pub enum InsertError {
    /// index error
    Index(#[from] IndexError),
}

/// A slice represents a piece cut out of a larger document. It stores not
/// only a fragment, but also the depth up to which nodes on both sides are
/// ‘open’ (cut through).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice {
    /// The slice's content.
    #[serde(skip_serializing_if = "Fragment::is_empty")]
    pub content: Fragment,
    /// The open depth at the start.
    #[serde(skip_serializing_if = "is_zero")]
    pub open_start: usize,
    /// The open depth at the end.
    #[serde(skip_serializing_if = "is_zero")]
    pub open_end: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Slice {
    /// Create a slice. When specifying a non-zero open depth, you must make
    /// sure that there are nodes of at least that depth at the appropriate
    /// side of the fragment — i.e. if the fragment is an empty paragraph
    /// node, `open_start` and `open_end` can't be greater than 1.
    ///
    /// It is not necessary for the content of open nodes to conform to the
    /// schema's content constraints, though it should be a valid
    /// start/end/middle for such a node, depending on which sides are open.
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Slice {
        Slice {
            content,
            open_start,
            open_end,
        }
    }

    /// The size a slice spans when inserted into a document.
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }

    /// True when this slice carries no content and no open depths.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.open_start == 0 && self.open_end == 0
    }

    /// Insert a fragment at the given position inside the slice's content,
    /// descending into open nodes as needed. Returns `None` when the
    /// receiving parent rejects the insertion.
    pub fn insert_at(&self, pos: usize, fragment: Fragment) -> Result<Option<Slice>, InsertError> {
        let content = insert_into(&self.content, pos + self.open_start, fragment, None)?;
        Ok(content.map(|c| Slice::new(c, self.open_start, self.open_end)))
    }
}

fn insert_into(
    content: &Fragment,
    dist: usize,
    insert: Fragment,
    parent: Option<&Node>,
) -> Result<Option<Fragment>, InsertError> {
    let index = content.find_index(dist)?;
    let child = content.maybe_child(index.index);
    if index.offset == dist || matches!(child, Some(c) if c.is_text()) {
        if let Some(parent) = parent {
            if !parent.can_replace(index.index, index.index, &insert, ..) {
                return Ok(None);
            }
        }
        Ok(Some(
            content
                .cut(..dist)
                .append(insert)
                .append(content.cut(dist..)),
        ))
    } else {
        let child = child.expect("offset != dist implies a covering child");
        let inner = insert_into(child.content(), dist - index.offset - 1, insert, None)?;
        Ok(inner.map(|inner| content.replace_child(index.index, child.copy(|_| inner))))
    }
}
