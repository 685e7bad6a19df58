//! The `replace` and `replaceAround` steps.

use super::step::{StepDecodeError, StepKind, StepResult};
use super::util::{is_false, Span};
use super::StepError;
use crate::model::{Node, ResolveErr, Schema, Slice, SliceJson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Replace a part of the document with a slice of new content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStep {
    /// The affected span
    #[serde(flatten)]
    pub span: Span,
    /// The slice to replace the current content with
    #[serde(skip_serializing_if = "Slice::is_empty")]
    pub slice: Slice,
    /// Whether this is a structural change. Carried on the wire for
    /// position mapping, but not validated when applying.
    #[serde(skip_serializing_if = "is_false")]
    pub structure: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReplaceJson {
    from: usize,
    to: usize,
    #[serde(default)]
    slice: Option<SliceJson>,
    #[serde(default)]
    structure: bool,
}

impl ReplaceStep {
    pub(crate) fn from_value(schema: &Schema, payload: Value) -> Result<Self, StepDecodeError> {
        let wire: ReplaceJson = serde_json::from_value(payload)?;
        Ok(ReplaceStep {
            span: Span::new(wire.from, wire.to),
            slice: schema.slice_from_wire(wire.slice.unwrap_or_default())?,
            structure: wire.structure,
        })
    }
}

impl StepKind for ReplaceStep {
    fn apply(&self, doc: &Node) -> StepResult {
        Ok(doc.replace(self.span.from..self.span.to, &self.slice)?)
    }
}

/// Replace the document structure while keeping a gap of content.
///
/// The content between `gap_from` and `gap_to` is lifted out, inserted into
/// the slice at position `insert`, and the whole span is then replaced with
/// the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAroundStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// Start of the gap
    pub gap_from: usize,
    /// End of the gap
    pub gap_to: usize,
    /// The slice wrapped around the gap
    #[serde(skip_serializing_if = "Slice::is_empty")]
    pub slice: Slice,
    /// The position in the slice at which the gap content is inserted
    pub insert: usize,
    /// Whether this is a structural change: when set, the step refuses to
    /// overwrite content between the span and the gap
    pub structure: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReplaceAroundJson {
    from: usize,
    to: usize,
    gap_from: usize,
    gap_to: usize,
    insert: usize,
    #[serde(default)]
    slice: Option<SliceJson>,
    #[serde(default)]
    structure: bool,
}

impl ReplaceAroundStep {
    pub(crate) fn from_value(schema: &Schema, payload: Value) -> Result<Self, StepDecodeError> {
        let wire: ReplaceAroundJson = serde_json::from_value(payload)?;
        Ok(ReplaceAroundStep {
            span: Span::new(wire.from, wire.to),
            gap_from: wire.gap_from,
            gap_to: wire.gap_to,
            insert: wire.insert,
            slice: schema.slice_from_wire(wire.slice.unwrap_or_default())?,
            structure: wire.structure,
        })
    }
}

impl StepKind for ReplaceAroundStep {
    fn apply(&self, doc: &Node) -> StepResult {
        if self.structure
            && (content_between(doc, self.span.from, self.gap_from)?
                || content_between(doc, self.gap_to, self.span.to)?)
        {
            return Err(StepError::GapWouldOverwrite);
        }

        let gap = doc.slice(self.gap_from..self.gap_to, false)?;
        if gap.open_start != 0 || gap.open_end != 0 {
            return Err(StepError::GapNotFlat);
        }

        let inserted = self
            .slice
            .insert_at(self.insert, gap.content)?
            .ok_or(StepError::GapNotFit)?;

        Ok(doc.replace(self.span.from..self.span.to, &inserted)?)
    }
}

/// Walk outward from `from`, checking whether any node boundary between
/// `from` and `to` has content hanging off it.
fn content_between(doc: &Node, from: usize, to: usize) -> Result<bool, ResolveErr> {
    let rp_from = doc.resolve(from)?;
    let mut dist = to - from;
    let mut depth = rp_from.depth();
    while dist > 0 && depth > 0 && rp_from.index_after(depth) == rp_from.node(depth).child_count() {
        depth -= 1;
        dist -= 1;
    }
    if dist > 0 {
        let mut next = rp_from.node(depth).maybe_child(rp_from.index_after(depth));
        while dist > 0 {
            match next {
                Some(child) => {
                    if child.is_leaf() {
                        return Ok(true);
                    }
                    next = child.first_child();
                    dist -= 1;
                }
                None => return Ok(true),
            }
        }
    }
    Ok(false)
}
