//! # The document model
//!
//! Schemas, nodes, fragments, marks, positions, slices and the replace
//! engine, plus the JSON (de)serialization of all of them.

mod content;
mod de;
mod fragment;
mod mark;
mod node;
mod replace;
mod resolved_pos;
mod schema;
mod slice;
#[cfg(test)]
pub(crate) mod testutil;
pub(crate) mod util;

pub use content::{ContentMatch, ExprError};
pub use de::DecodeError;
pub use fragment::{Fragment, Index, IndexError};
pub use mark::Mark;
pub use node::{BlockNode, Node, Text, TextNode};
pub use replace::ReplaceError;
pub use resolved_pos::{ResolveErr, ResolvedNode, ResolvedPos};
pub use schema::{
    Attribute, Attrs, ContentCheckError, MarkSpec, MarkType, NodeSpec, NodeType, Schema,
    SchemaError, SchemaSpec,
};
pub use slice::{InsertError, Slice};

pub(crate) use de::{MarkJson, SliceJson};
