//! Shared schema and node builders for the unit tests.

use super::{Attrs, Fragment, Node, NodeSpec, Schema, SchemaSpec};
use once_cell::sync::Lazy;
use serde_json::json;
use std::collections::BTreeMap;

/// A spec close to the classic basic schema: doc/paragraph/blockquote/
/// heading/code_block/lists plus the usual inline types and marks.
pub(crate) fn spec() -> SchemaSpec {
    let mut nodes = Vec::new();
    nodes.push((
        "doc".to_owned(),
        NodeSpec {
            content: Some("block+".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "paragraph".to_owned(),
        NodeSpec {
            content: Some("inline*".to_owned()),
            group: Some("block".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "blockquote".to_owned(),
        NodeSpec {
            content: Some("block+".to_owned()),
            group: Some("block".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "horizontal_rule".to_owned(),
        NodeSpec {
            group: Some("block".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "heading".to_owned(),
        NodeSpec {
            content: Some("inline*".to_owned()),
            group: Some("block".to_owned()),
            attrs: BTreeMap::from([(
                "level".to_owned(),
                super::Attribute {
                    default: Some(json!(1)),
                },
            )]),
            ..Default::default()
        },
    ));
    nodes.push((
        "code_block".to_owned(),
        NodeSpec {
            content: Some("text*".to_owned()),
            group: Some("block".to_owned()),
            marks: Some(String::new()),
            attrs: BTreeMap::from([("language".to_owned(), super::Attribute::default())]),
            ..Default::default()
        },
    ));
    nodes.push((
        "bullet_list".to_owned(),
        NodeSpec {
            content: Some("list_item+".to_owned()),
            group: Some("block".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "list_item".to_owned(),
        NodeSpec {
            content: Some("paragraph+".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "text".to_owned(),
        NodeSpec {
            group: Some("inline".to_owned()),
            ..Default::default()
        },
    ));
    nodes.push((
        "image".to_owned(),
        NodeSpec {
            inline: true,
            group: Some("inline".to_owned()),
            attrs: BTreeMap::from([
                ("src".to_owned(), super::Attribute::default()),
                ("alt".to_owned(), super::Attribute::default()),
                ("title".to_owned(), super::Attribute::default()),
            ]),
            ..Default::default()
        },
    ));
    nodes.push((
        "hard_break".to_owned(),
        NodeSpec {
            inline: true,
            group: Some("inline".to_owned()),
            ..Default::default()
        },
    ));

    SchemaSpec {
        nodes,
        marks: vec![
            ("link".to_owned(), Default::default()),
            ("em".to_owned(), Default::default()),
            ("strong".to_owned(), Default::default()),
            ("code".to_owned(), Default::default()),
        ],
        top_node: Some("doc".to_owned()),
    }
}

static SCHEMA: Lazy<Schema> = Lazy::new(|| Schema::new(spec()).expect("test schema compiles"));

pub(crate) fn schema() -> Schema {
    SCHEMA.clone()
}

pub(crate) fn doc(children: Vec<Node>) -> Node {
    SCHEMA
        .node("doc", None, Fragment::from(children), Vec::new())
        .unwrap()
}

pub(crate) fn p(children: Vec<Node>) -> Node {
    SCHEMA
        .node("paragraph", None, Fragment::from(children), Vec::new())
        .unwrap()
}

pub(crate) fn p_text(text: &str) -> Node {
    if text.is_empty() {
        return p(Vec::new());
    }
    p(vec![SCHEMA.text(text)])
}

pub(crate) fn blockquote(children: Vec<Node>) -> Node {
    SCHEMA
        .node("blockquote", None, Fragment::from(children), Vec::new())
        .unwrap()
}

pub(crate) fn h1(text: &str) -> Node {
    let mut attrs = Attrs::new();
    attrs.insert("level".to_owned(), json!(1));
    SCHEMA
        .node(
            "heading",
            Some(attrs),
            Fragment::from(vec![SCHEMA.text(text)]),
            Vec::new(),
        )
        .unwrap()
}

pub(crate) fn bullet_list(children: Vec<Node>) -> Node {
    SCHEMA
        .node("bullet_list", None, Fragment::from(children), Vec::new())
        .unwrap()
}

pub(crate) fn li(children: Vec<Node>) -> Node {
    SCHEMA
        .node("list_item", None, Fragment::from(children), Vec::new())
        .unwrap()
}

pub(crate) fn em_text(text: &str) -> Node {
    SCHEMA
        .text(text)
        .with_marks(vec![SCHEMA.mark("em", None).unwrap()])
}
