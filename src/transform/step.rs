//! The step envelope: dispatch, application errors and JSON decoding.

use super::{AddMarkStep, RemoveMarkStep, ReplaceAroundStep, ReplaceStep};
use crate::model::{
    DecodeError, InsertError, Node, ReplaceError, ResolveErr, Schema,
};
use displaydoc::Display;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Different ways a step application can fail.
#[derive(Debug, Display, Error)]
pub enum StepError {
    /// structure gap-replace would overwrite content
    GapWouldOverwrite,
    /// gap is not a flat range
    GapNotFlat,
    /// content does not fit in gap
    GapNotFit,
    /// invalid position
    Resolve(#[from] ResolveErr),
    /// replace failed
    Replace(#[from] ReplaceError),
    /// insert failed
    Insert(#[from] InsertError),
}

/// Errors from decoding a step from its JSON envelope.
#[derive(Debug, Display, Error)]
pub enum StepDecodeError {
    /// missing stepType
    MissingStepType,
    /// unknown step type: {0}
    UnknownStepType(String),
    /// malformed JSON
    Json(#[from] serde_json::Error),
    /// malformed step payload
    Decode(#[from] DecodeError),
}

/// The result of applying a step: a new document, or a failure value.
pub type StepResult = Result<Node, StepError>;

/// A step object represents an atomic change.
///
/// It generally applies only to the document it was created for, since the
/// positions stored in it will only make sense for that document.
pub trait StepKind {
    /// Apply this step to the given document, returning either the
    /// transformed document or a failure.
    fn apply(&self, doc: &Node) -> StepResult;
}

/// A wire-serializable edit operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Replace some content
    Replace(ReplaceStep),
    /// Replace the structure around some content
    ReplaceAround(ReplaceAroundStep),
    /// Add a mark to a span
    AddMark(AddMarkStep),
    /// Remove a mark from a span
    RemoveMark(RemoveMarkStep),
}

impl Step {
    /// Apply this step to the given document.
    pub fn apply(&self, doc: &Node) -> StepResult {
        match self {
            Step::Replace(step) => step.apply(doc),
            Step::ReplaceAround(step) => step.apply(doc),
            Step::AddMark(step) => step.apply(doc),
            Step::RemoveMark(step) => step.apply(doc),
        }
    }

    /// Decode a step from its JSON text.
    pub fn from_json(schema: &Schema, data: &str) -> Result<Step, StepDecodeError> {
        let value: Value = serde_json::from_str(data)?;
        Step::from_value(schema, &value)
    }

    /// Decode a step from a JSON value by reading the polymorphic
    /// `stepType` envelope and dispatching to the named kind.
    pub fn from_value(schema: &Schema, value: &Value) -> Result<Step, StepDecodeError> {
        let name = value
            .get("stepType")
            .and_then(Value::as_str)
            .ok_or(StepDecodeError::MissingStepType)?
            .to_owned();

        let mut payload = value.clone();
        if let Some(map) = payload.as_object_mut() {
            map.remove("stepType");
        }

        match name.as_str() {
            "replace" => Ok(Step::Replace(ReplaceStep::from_value(schema, payload)?)),
            "replaceAround" => Ok(Step::ReplaceAround(ReplaceAroundStep::from_value(
                schema, payload,
            )?)),
            "addMark" => Ok(Step::AddMark(AddMarkStep::from_value(schema, payload)?)),
            "removeMark" => Ok(Step::RemoveMark(RemoveMarkStep::from_value(
                schema, payload,
            )?)),
            _ => Err(StepDecodeError::UnknownStepType(name)),
        }
    }
}
