//! JSON decoding with a schema context.
//!
//! Serialization is implemented directly on the model types, but decoding a
//! node, mark or slice requires resolving type *names* against a schema.
//! Instead of a global type registry, the schema is threaded through
//! explicitly: the wire shapes below are plain serde structs, and the
//! [`Schema`] methods hydrate them into model values.

use super::{Attrs, Fragment, Mark, Node, Schema, Slice};
use displaydoc::Display;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from decoding documents, marks or slices against a schema.
#[derive(Debug, Display, Error)]
pub enum DecodeError {
    /// unknown node type {0:?}
    UnknownNodeType(String),
    /// unknown mark type {0:?}
    UnknownMarkType(String),
    /// text node without text
    MissingText,
    /// malformed JSON
    Json(#[from] serde_json::Error),
}

/// The wire shape of a node.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NodeJson {
    pub r#type: String,
    #[serde(default)]
    pub attrs: Option<Attrs>,
    #[serde(default)]
    pub marks: Option<Vec<MarkJson>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<NodeJson>>,
}

/// The wire shape of a mark.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MarkJson {
    pub r#type: String,
    #[serde(default)]
    pub attrs: Option<Attrs>,
}

/// The wire shape of a slice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct SliceJson {
    #[serde(default)]
    pub content: Vec<NodeJson>,
    #[serde(default)]
    pub open_start: usize,
    #[serde(default)]
    pub open_end: usize,
}

impl Schema {
    /// Decode a node from its JSON text.
    pub fn node_from_json(&self, data: &str) -> Result<Node, DecodeError> {
        let wire: NodeJson = serde_json::from_str(data)?;
        self.node_from_wire(wire)
    }

    /// Decode a node from a JSON value.
    pub fn node_from_value(&self, value: &Value) -> Result<Node, DecodeError> {
        let wire: NodeJson = serde_json::from_value(value.clone())?;
        self.node_from_wire(wire)
    }

    /// Decode a mark from a JSON value.
    pub fn mark_from_value(&self, value: &Value) -> Result<Mark, DecodeError> {
        let wire: MarkJson = serde_json::from_value(value.clone())?;
        self.mark_from_wire(wire)
    }

    /// Decode a slice from a JSON value.
    pub fn slice_from_value(&self, value: &Value) -> Result<Slice, DecodeError> {
        let wire: SliceJson = serde_json::from_value(value.clone())?;
        self.slice_from_wire(wire)
    }

    pub(crate) fn node_from_wire(&self, wire: NodeJson) -> Result<Node, DecodeError> {
        let r#type = self
            .node_type(&wire.r#type)
            .ok_or_else(|| DecodeError::UnknownNodeType(wire.r#type.clone()))?;

        let marks = wire
            .marks
            .unwrap_or_default()
            .into_iter()
            .map(|mark| self.mark_from_wire(mark))
            .collect::<Result<Vec<_>, _>>()?;

        if r#type.is_text() {
            let text = wire.text.ok_or(DecodeError::MissingText)?;
            Ok(Node::text_of(r#type, text, marks))
        } else {
            let children = wire
                .content
                .unwrap_or_default()
                .into_iter()
                .map(|child| self.node_from_wire(child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::block(
                r#type,
                wire.attrs.unwrap_or_default(),
                marks,
                Fragment::from(children),
            ))
        }
    }

    pub(crate) fn mark_from_wire(&self, wire: MarkJson) -> Result<Mark, DecodeError> {
        let r#type = self
            .mark_type(&wire.r#type)
            .ok_or_else(|| DecodeError::UnknownMarkType(wire.r#type.clone()))?;
        Ok(r#type.create(wire.attrs))
    }

    pub(crate) fn slice_from_wire(&self, wire: SliceJson) -> Result<Slice, DecodeError> {
        let children = wire
            .content
            .into_iter()
            .map(|child| self.node_from_wire(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Slice::new(
            Fragment::from(children),
            wire.open_start,
            wire.open_end,
        ))
    }
}
