//! # The document transformations
//!
//! Wire-serializable steps that apply to a document and produce a new one.
//! Steps decode through a [`Schema`](crate::model::Schema) context, see
//! [`Step::from_json`].

mod mark_step;
mod replace_step;
mod step;
mod util;

pub use mark_step::{AddMarkStep, RemoveMarkStep};
pub use replace_step::{ReplaceAroundStep, ReplaceStep};
pub use step::{Step, StepDecodeError, StepError, StepKind, StepResult};
pub use util::Span;

/// A list of steps.
pub type Steps = Vec<Step>;
