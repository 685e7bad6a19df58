//! The `addMark` and `removeMark` steps.

use super::step::{StepDecodeError, StepKind, StepResult};
use super::util::Span;
use crate::model::{Fragment, Mark, MarkJson, Node, Schema, Slice};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Map every inline node of a fragment through `f`, rebuilding the
/// composite nodes around them. The callback also receives the parent node
/// and the child index.
fn map_fragment_parent<F>(fragment: &Fragment, f: &F, parent: &Node) -> Fragment
where
    F: Fn(Node, &Node, usize) -> Node,
{
    let mut mapped = Vec::new();
    for (i, child) in fragment.children().iter().enumerate() {
        let mut child = child.copy(|c| map_fragment_parent(c, f, child));
        if child.is_inline() {
            child = f(child, parent, i);
        }
        mapped.push(child);
    }
    Fragment::from(mapped)
}

fn map_fragment<F>(fragment: &Fragment, f: &F) -> Fragment
where
    F: Fn(Node) -> Node,
{
    let mut mapped = Vec::new();
    for child in fragment.children() {
        let mut child = child.copy(|c| map_fragment(c, f));
        if child.is_inline() {
            child = f(child);
        }
        mapped.push(child);
    }
    Fragment::from(mapped)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkStepJson {
    from: usize,
    to: usize,
    mark: MarkJson,
}

/// Add a mark to all inline content between two positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMarkStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// The mark to add
    pub mark: Mark,
}

impl AddMarkStep {
    pub(crate) fn from_value(schema: &Schema, payload: Value) -> Result<Self, StepDecodeError> {
        let wire: MarkStepJson = serde_json::from_value(payload)?;
        Ok(AddMarkStep {
            span: Span::new(wire.from, wire.to),
            mark: schema.mark_from_wire(wire.mark)?,
        })
    }
}

impl StepKind for AddMarkStep {
    fn apply(&self, doc: &Node) -> StepResult {
        let old_slice = doc.slice(self.span.from..self.span.to, false)?;
        let rp_from = doc.resolve(self.span.from)?;
        let parent = rp_from.node(rp_from.shared_depth(self.span.to));

        let new_content = map_fragment_parent(
            &old_slice.content,
            &|node, parent, _i| {
                if node.is_atom() && parent.r#type().allows_mark_type(&self.mark.r#type) {
                    let marks = self.mark.add_to_set(node.marks());
                    node.with_marks(marks)
                } else {
                    node
                }
            },
            parent,
        );

        let slice = Slice::new(new_content, old_slice.open_start, old_slice.open_end);
        Ok(doc.replace(self.span.from..self.span.to, &slice)?)
    }
}

/// Remove a mark from all inline content between two positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMarkStep {
    /// The affected part of the document
    #[serde(flatten)]
    pub span: Span,
    /// The mark to remove
    pub mark: Mark,
}

impl RemoveMarkStep {
    pub(crate) fn from_value(schema: &Schema, payload: Value) -> Result<Self, StepDecodeError> {
        let wire: MarkStepJson = serde_json::from_value(payload)?;
        Ok(RemoveMarkStep {
            span: Span::new(wire.from, wire.to),
            mark: schema.mark_from_wire(wire.mark)?,
        })
    }
}

impl StepKind for RemoveMarkStep {
    fn apply(&self, doc: &Node) -> StepResult {
        let old_slice = doc.slice(self.span.from..self.span.to, false)?;

        let new_content = map_fragment(&old_slice.content, &|node| {
            let marks = self.mark.remove_from_set(node.marks());
            node.with_marks(marks)
        });

        let slice = Slice::new(new_content, old_slice.open_start, old_slice.open_end);
        Ok(doc.replace(self.span.from..self.span.to, &slice)?)
    }
}
