#![warn(missing_docs)]
//! # A ProseMirror-compatible document engine
//!
//! This crate is a re-implementation of the core of the
//! [ProseMirror](https://prosemirror.net) document model in Rust. It provides
//! a runtime-compiled [`Schema`](model::Schema) with content-expression
//! validation, an immutable document tree addressed by UTF-16 positions, a
//! slice/replace algebra, and the wire-compatible step protocol used to
//! exchange edits with collaborative editors.
//!
//! Documents are plain values: every operation takes the old document by
//! reference and returns a new one, so a collaborative authority can keep
//! multiple revisions around and apply steps from several clients without
//! locking.

pub mod model;
pub mod transform;
