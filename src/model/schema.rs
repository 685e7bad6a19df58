//! Schema compilation.
//!
//! A [`SchemaSpec`] is a plain description of node and mark types. Compiling
//! it resolves every content expression into a [`ContentMatch`] automaton,
//! computes the allowed-marks set of each node type and checks the schema
//! invariants (a `text` type without attributes, a known top node). The
//! resulting [`Schema`] is an immutable, cheaply clonable handle; node and
//! mark types are handles into its tables.

use super::content::{self, ContentMatch, Dfa, ExprError};
use super::{Fragment, Mark, Node};
use displaydoc::Display;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// An attribute map, as carried by nodes and marks.
pub type Attrs = serde_json::Map<String, Value>;

/// The declaration of a single attribute on a node or mark type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    /// The default value. An attribute without a default is required.
    pub default: Option<Value>,
}

impl Attribute {
    /// True when this attribute must be provided by the creator of a node.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The description of a node type, part of a [`SchemaSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    /// The content expression for this node, e.g. `"block+"` or `"text*"`.
    /// Absent for leaf nodes.
    pub content: Option<String>,
    /// The marks allowed inside this node: a space-separated list of mark
    /// names or groups, `"_"` for all marks, `""` for none. When absent,
    /// nodes with inline content allow all marks and other nodes none.
    pub marks: Option<String>,
    /// The group or groups (space-separated) this node belongs to.
    pub group: Option<String>,
    /// Should be true for inline nodes.
    pub inline: bool,
    /// Can be set to true to mark non-leaf nodes as atoms.
    pub atom: bool,
    /// The attributes this node can have.
    pub attrs: BTreeMap<String, Attribute>,
}

/// The description of a mark type, part of a [`SchemaSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkSpec {
    /// The attributes this mark can have.
    pub attrs: BTreeMap<String, Attribute>,
    /// Which other marks this mark excludes: a space-separated list of mark
    /// names or groups, `""` for none. When absent a mark excludes itself.
    pub excludes: Option<String>,
    /// The group or groups (space-separated) this mark belongs to.
    pub group: Option<String>,
}

/// The description of a full document schema.
///
/// The order of the node list is significant: it determines the expansion
/// order of group names inside content expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSpec {
    /// The node types of this schema, in declaration order.
    pub nodes: Vec<(String, NodeSpec)>,
    /// The mark types of this schema, in declaration order.
    pub marks: Vec<(String, MarkSpec)>,
    /// The name of the top-level node type; defaults to `"doc"`.
    pub top_node: Option<String>,
}

/// Errors from compiling a [`SchemaSpec`] or resolving names against a
/// compiled [`Schema`].
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// no top-level node type {0:?} defined in schema
    UnknownTopNode(String),
    /// no text node type defined in schema
    MissingTextType,
    /// the text node type must not have attributes
    TextTypeAttrs,
    /// duplicate node type {0:?} in schema
    DuplicateNodeType(String),
    /// duplicate mark type {0:?} in schema
    DuplicateMarkType(String),
    /// error compiling content expression for node type {name:?}
    Content {
        /// The node type whose expression failed to compile
        name: String,
        /// The underlying expression error
        source: ExprError,
    },
    /// unknown mark type {mark:?} allowed by node type {name:?}
    UnknownMarkInNode {
        /// The node type naming the mark
        name: String,
        /// The unresolvable mark name
        mark: String,
    },
    /// unknown node type {0:?}
    UnknownNodeType(String),
    /// unknown mark type {0:?}
    UnknownMarkType(String),
}

pub(crate) struct NodeTypeData {
    pub(crate) name: String,
    pub(crate) spec: NodeSpec,
    pub(crate) groups: Vec<String>,
    pub(crate) block: bool,
    pub(crate) text: bool,
    pub(crate) leaf: bool,
    pub(crate) inline_content: bool,
    pub(crate) attrs: BTreeMap<String, Attribute>,
    pub(crate) dfa: Arc<Dfa>,
    /// Allowed mark type indices; `None` allows every mark.
    pub(crate) marks: Option<Vec<usize>>,
}

pub(crate) struct MarkTypeData {
    pub(crate) name: String,
    pub(crate) spec: MarkSpec,
    pub(crate) groups: Vec<String>,
    pub(crate) attrs: BTreeMap<String, Attribute>,
    pub(crate) excluded: Vec<usize>,
}

pub(crate) struct SchemaData {
    pub(crate) spec: SchemaSpec,
    pub(crate) nodes: Vec<NodeTypeData>,
    pub(crate) marks: Vec<MarkTypeData>,
    pub(crate) node_index: HashMap<String, usize>,
    pub(crate) mark_index: HashMap<String, usize>,
    pub(crate) top: usize,
}

/// A compiled document schema.
///
/// Cloning is cheap; all clones share the same type tables. Documents keep
/// handles into the schema they were created from, so a schema outlives its
/// documents naturally.
#[derive(Clone)]
pub struct Schema {
    data: Arc<SchemaData>,
}

impl Schema {
    /// Compile a schema from its spec.
    pub fn new(spec: SchemaSpec) -> Result<Schema, SchemaError> {
        let mut nodes = Vec::with_capacity(spec.nodes.len());
        let mut node_index = HashMap::new();
        for (name, node_spec) in &spec.nodes {
            if node_index.insert(name.clone(), nodes.len()).is_some() {
                return Err(SchemaError::DuplicateNodeType(name.clone()));
            }
            nodes.push(NodeTypeData {
                name: name.clone(),
                groups: split_names(node_spec.group.as_deref()),
                block: !node_spec.inline && name != "text",
                text: name == "text",
                leaf: node_spec.content.is_none(),
                inline_content: false,
                attrs: node_spec.attrs.clone(),
                dfa: Dfa::empty(),
                marks: None,
                spec: node_spec.clone(),
            });
        }

        let top_name = spec.top_node.clone().unwrap_or_else(|| "doc".to_owned());
        let top = *node_index
            .get(&top_name)
            .ok_or(SchemaError::UnknownTopNode(top_name))?;
        let text = *node_index.get("text").ok_or(SchemaError::MissingTextType)?;
        if !nodes[text].attrs.is_empty() {
            return Err(SchemaError::TextTypeAttrs);
        }

        let mut marks = Vec::with_capacity(spec.marks.len());
        let mut mark_index = HashMap::new();
        for (name, mark_spec) in &spec.marks {
            if mark_index.insert(name.clone(), marks.len()).is_some() {
                return Err(SchemaError::DuplicateMarkType(name.clone()));
            }
            marks.push(MarkTypeData {
                name: name.clone(),
                groups: split_names(mark_spec.group.as_deref()),
                attrs: mark_spec.attrs.clone(),
                excluded: Vec::new(),
                spec: mark_spec.clone(),
            });
        }

        for i in 0..marks.len() {
            let excluded = match marks[i].spec.excludes.clone() {
                None => vec![i],
                Some(s) if s.is_empty() => Vec::new(),
                Some(s) => gather_marks(&s, &marks, &mark_index)
                    .map_err(SchemaError::UnknownMarkType)?,
            };
            marks[i].excluded = excluded;
        }

        // Automata are cached per expression string, so types sharing an
        // expression share one DFA.
        let mut cache: HashMap<String, Arc<Dfa>> = HashMap::new();
        for i in 0..nodes.len() {
            let Some(src) = nodes[i].spec.content.clone() else {
                continue;
            };
            let dfa = match cache.get(&src) {
                Some(dfa) => dfa.clone(),
                None => {
                    let expr = content::parse_expr(&src, &nodes, &node_index).map_err(
                        |source| SchemaError::Content {
                            name: nodes[i].name.clone(),
                            source,
                        },
                    )?;
                    let dfa = Arc::new(content::compile_expr(&expr));
                    cache.insert(src, dfa.clone());
                    dfa
                }
            };
            let inline_content = match dfa.states[0].next.first() {
                Some(&(term, _)) => !nodes[term].block,
                None => true,
            };
            nodes[i].inline_content = inline_content;
            nodes[i].dfa = dfa;
        }

        for i in 0..nodes.len() {
            let allowed = match nodes[i].spec.marks.clone() {
                Some(s) if s == "_" => None,
                Some(s) if s.is_empty() => Some(Vec::new()),
                Some(s) => Some(gather_marks(&s, &marks, &mark_index).map_err(|mark| {
                    SchemaError::UnknownMarkInNode {
                        name: nodes[i].name.clone(),
                        mark,
                    }
                })?),
                None if nodes[i].inline_content => None,
                None => Some(Vec::new()),
            };
            nodes[i].marks = allowed;
        }

        Ok(Schema {
            data: Arc::new(SchemaData {
                spec,
                nodes,
                marks,
                node_index,
                mark_index,
                top,
            }),
        })
    }

    /// The spec this schema was compiled from.
    pub fn spec(&self) -> &SchemaSpec {
        &self.data.spec
    }

    /// Look up a node type by name.
    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.data.node_index.get(name).map(|&index| NodeType {
            schema: self.data.clone(),
            index,
        })
    }

    /// Look up a mark type by name.
    pub fn mark_type(&self, name: &str) -> Option<MarkType> {
        self.data.mark_index.get(name).map(|&index| MarkType {
            schema: self.data.clone(),
            index,
        })
    }

    /// The type of the top-level node of this schema.
    pub fn top_node_type(&self) -> NodeType {
        NodeType {
            schema: self.data.clone(),
            index: self.data.top,
        }
    }

    /// Create a composite node, without validating its content.
    ///
    /// Panics when `name` refers to the text type; use [`Schema::text`] for
    /// text nodes. Use [`NodeType::create`] for a validating constructor.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<Attrs>,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> Result<Node, SchemaError> {
        let r#type = self
            .node_type(name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_owned()))?;
        assert!(
            !r#type.is_text(),
            "cannot create a text node through Schema::node"
        );
        Ok(Node::block(r#type, attrs.unwrap_or_default(), marks, content))
    }

    /// Create a text node.
    pub fn text(&self, text: impl Into<String>) -> Node {
        let r#type = self
            .node_type("text")
            .expect("schema compilation guarantees a text type");
        Node::text_of(r#type, text.into(), Vec::new())
    }

    /// Create a mark.
    pub fn mark(&self, name: &str, attrs: Option<Attrs>) -> Result<Mark, SchemaError> {
        let r#type = self
            .mark_type(name)
            .ok_or_else(|| SchemaError::UnknownMarkType(name.to_owned()))?;
        Ok(r#type.create(attrs))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<&str> = self.data.nodes.iter().map(|n| n.name.as_str()).collect();
        let marks: Vec<&str> = self.data.marks.iter().map(|m| m.name.as_str()).collect();
        f.debug_struct("Schema")
            .field("nodes", &nodes)
            .field("marks", &marks)
            .finish()
    }
}

fn split_names(src: Option<&str>) -> Vec<String> {
    src.map(|s| s.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Resolve a space-separated list of mark names or groups to mark indices.
/// Returns the first unresolvable name on failure.
fn gather_marks(
    src: &str,
    marks: &[MarkTypeData],
    mark_index: &HashMap<String, usize>,
) -> Result<Vec<usize>, String> {
    let mut found = Vec::new();
    for name in src.split_whitespace() {
        if let Some(&index) = mark_index.get(name) {
            if !found.contains(&index) {
                found.push(index);
            }
            continue;
        }
        let mut any = false;
        for (index, mark) in marks.iter().enumerate() {
            if mark.groups.iter().any(|g| g == name) {
                any = true;
                if !found.contains(&index) {
                    found.push(index);
                }
            }
        }
        if !any {
            return Err(name.to_owned());
        }
    }
    Ok(found)
}

/// Errors from validating a fragment against a node type's content
/// expression and allowed marks.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ContentCheckError {
    /// content does not match node type {0:?}
    NoMatch(String),
    /// invalid end of content for node type {0:?}
    InvalidEnd(String),
    /// mark {mark:?} not allowed in node type {name:?}
    MarkNotAllowed {
        /// The offending mark's type name
        mark: String,
        /// The node type that rejected it
        name: String,
    },
}

/// A compiled node type, holding the type's flags, attribute declarations
/// and content automaton. Handles compare equal by name.
#[derive(Clone)]
pub struct NodeType {
    pub(crate) schema: Arc<SchemaData>,
    pub(crate) index: usize,
}

impl NodeType {
    fn data(&self) -> &NodeTypeData {
        &self.schema.nodes[self.index]
    }

    /// The name of this type.
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// The spec this type was compiled from.
    pub fn spec(&self) -> &NodeSpec {
        &self.data().spec
    }

    /// The groups this type belongs to.
    pub fn groups(&self) -> &[String] {
        &self.data().groups
    }

    /// The attribute declarations of this type.
    pub fn attrs(&self) -> &BTreeMap<String, Attribute> {
        &self.data().attrs
    }

    /// True when any attribute of this type has no default value.
    pub fn has_required_attrs(&self) -> bool {
        self.data().attrs.values().any(Attribute::is_required)
    }

    /// True when this is a block (non-inline) type.
    pub fn is_block(&self) -> bool {
        self.data().block
    }

    /// True when this is the text type.
    pub fn is_text(&self) -> bool {
        self.data().text
    }

    /// True when this is an inline type.
    pub fn is_inline(&self) -> bool {
        !self.data().block
    }

    /// True when this type has no content expression.
    pub fn is_leaf(&self) -> bool {
        self.data().leaf
    }

    /// True when nodes of this type are counted as a single unit: leaves and
    /// types whose spec sets `atom`.
    pub fn is_atom(&self) -> bool {
        self.data().leaf || self.data().spec.atom
    }

    /// True when this is a block type with inline content.
    pub fn is_text_block(&self) -> bool {
        self.data().block && self.data().inline_content
    }

    /// True when the first matchable child of this type is inline.
    pub fn inline_content(&self) -> bool {
        self.data().inline_content
    }

    /// The start state of this type's content automaton.
    pub fn content_match(&self) -> ContentMatch {
        ContentMatch {
            schema: self.schema.clone(),
            dfa: self.data().dfa.clone(),
            state: 0,
        }
    }

    /// True when the given mark type may appear on children of this type.
    pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
        match &self.data().marks {
            None => true,
            Some(allowed) => allowed
                .iter()
                .any(|&i| self.schema.marks[i].name == mark_type.name()),
        }
    }

    /// True when content of this type could end up in a node of `other`'s
    /// type: the types are equal or their automata share a first transition.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.content_match().compatible(&other.content_match())
    }

    /// Validate a fragment against this type's content expression, and the
    /// marks of its children against this type's allowed marks.
    pub fn check_content(&self, fragment: &Fragment) -> Result<(), ContentCheckError> {
        let result = self
            .content_match()
            .match_fragment(fragment)
            .ok_or_else(|| ContentCheckError::NoMatch(self.name().to_owned()))?;
        if !result.valid_end() {
            return Err(ContentCheckError::InvalidEnd(self.name().to_owned()));
        }
        for child in fragment.children() {
            self.check_marks(child.marks())?;
        }
        Ok(())
    }

    /// Check every mark in `marks` against this type's allowed set.
    pub fn check_marks(&self, marks: &[Mark]) -> Result<(), ContentCheckError> {
        for mark in marks {
            if !self.allows_mark_type(&mark.r#type) {
                return Err(ContentCheckError::MarkNotAllowed {
                    mark: mark.r#type.name().to_owned(),
                    name: self.name().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Create a node of this type, validating the content and marks.
    ///
    /// Panics when called on the text type; use [`Schema::text`] instead.
    pub fn create(
        &self,
        attrs: Option<Attrs>,
        marks: Vec<Mark>,
        content: Fragment,
    ) -> Result<Node, ContentCheckError> {
        assert!(!self.is_text(), "cannot create a text node through its type");
        self.check_content(&content)?;
        Ok(Node::block(
            self.clone(),
            attrs.unwrap_or_default(),
            marks,
            content,
        ))
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeType").field(&self.name()).finish()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled mark type. Handles compare equal by name.
#[derive(Clone)]
pub struct MarkType {
    pub(crate) schema: Arc<SchemaData>,
    pub(crate) index: usize,
}

impl MarkType {
    fn data(&self) -> &MarkTypeData {
        &self.schema.marks[self.index]
    }

    /// The name of this type.
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// The spec this type was compiled from.
    pub fn spec(&self) -> &MarkSpec {
        &self.data().spec
    }

    /// The attribute declarations of this type.
    pub fn attrs(&self) -> &BTreeMap<String, Attribute> {
        &self.data().attrs
    }

    /// The mark types excluded by this type. A mark excludes itself unless
    /// its spec says otherwise. The transform core records but does not
    /// enforce exclusion.
    pub fn excluded(&self) -> Vec<MarkType> {
        self.data()
            .excluded
            .iter()
            .map(|&index| MarkType {
                schema: self.schema.clone(),
                index,
            })
            .collect()
    }

    /// True when this mark type excludes `other`.
    pub fn excludes(&self, other: &MarkType) -> bool {
        self.data()
            .excluded
            .iter()
            .any(|&i| self.schema.marks[i].name == other.name())
    }

    /// Create a mark of this type.
    pub fn create(&self, attrs: Option<Attrs>) -> Mark {
        Mark {
            r#type: self.clone(),
            attrs: attrs.unwrap_or_default(),
        }
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MarkType").field(&self.name()).finish()
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{schema, spec};
    use super::super::Fragment;
    use super::{ContentCheckError, MarkSpec, NodeSpec, Schema, SchemaError};
    use pretty_assertions::assert_eq;

    #[test]
    fn compiles_the_base_schema() {
        let s = schema();
        assert_eq!(s.top_node_type().name(), "doc");
        assert!(s.node_type("paragraph").is_some());
        assert!(s.node_type("bogus").is_none());
        assert!(s.mark_type("em").is_some());
    }

    #[test]
    fn requires_a_top_node() {
        let mut spec = spec();
        spec.top_node = Some("missing".to_owned());
        assert_eq!(
            Schema::new(spec).unwrap_err(),
            SchemaError::UnknownTopNode("missing".to_owned())
        );
    }

    #[test]
    fn requires_a_text_type() {
        let mut spec = spec();
        spec.nodes.retain(|(name, _)| name != "text");
        assert_eq!(Schema::new(spec).unwrap_err(), SchemaError::MissingTextType);
    }

    #[test]
    fn rejects_text_attributes() {
        let mut spec = spec();
        for (name, node) in &mut spec.nodes {
            if name == "text" {
                node.attrs
                    .insert("weight".to_owned(), Default::default());
            }
        }
        assert_eq!(Schema::new(spec).unwrap_err(), SchemaError::TextTypeAttrs);
    }

    #[test]
    fn rejects_duplicate_types() {
        let mut spec = spec();
        spec.nodes.push(("paragraph".to_owned(), NodeSpec::default()));
        assert_eq!(
            Schema::new(spec).unwrap_err(),
            SchemaError::DuplicateNodeType("paragraph".to_owned())
        );
    }

    #[test]
    fn type_flags() {
        let s = schema();
        let text = s.node_type("text").unwrap();
        assert!(text.is_text() && text.is_inline() && text.is_leaf() && text.is_atom());
        assert!(!text.is_block());

        let para = s.node_type("paragraph").unwrap();
        assert!(para.is_block() && para.is_text_block());
        assert!(!para.is_leaf() && !para.is_atom());

        let rule = s.node_type("horizontal_rule").unwrap();
        assert!(rule.is_block() && rule.is_leaf() && rule.is_atom());

        let image = s.node_type("image").unwrap();
        assert!(image.is_inline() && image.is_leaf() && image.is_atom());
        assert!(image.has_required_attrs());
        assert!(!s.node_type("heading").unwrap().has_required_attrs());
    }

    #[test]
    fn allowed_marks_follow_the_sentinel_rules() {
        let s = schema();
        let em = s.mark_type("em").unwrap();

        // paragraph has no marks spec and inline content: everything allowed
        assert!(s.node_type("paragraph").unwrap().allows_mark_type(&em));
        // code_block sets marks to "": nothing allowed
        assert!(!s.node_type("code_block").unwrap().allows_mark_type(&em));
        // doc has no marks spec and block content: nothing allowed
        assert!(!s.node_type("doc").unwrap().allows_mark_type(&em));
    }

    #[test]
    fn explicit_mark_lists_resolve_names() {
        let mut spec = spec();
        spec.nodes.push((
            "caption".to_owned(),
            NodeSpec {
                content: Some("text*".to_owned()),
                marks: Some("em strong".to_owned()),
                ..Default::default()
            },
        ));
        let s = Schema::new(spec).unwrap();
        let caption = s.node_type("caption").unwrap();
        assert!(caption.allows_mark_type(&s.mark_type("em").unwrap()));
        assert!(caption.allows_mark_type(&s.mark_type("strong").unwrap()));
        assert!(!caption.allows_mark_type(&s.mark_type("link").unwrap()));

        let underscore_all = {
            let mut spec = super::super::testutil::spec();
            spec.nodes.push((
                "caption".to_owned(),
                NodeSpec {
                    content: Some("text*".to_owned()),
                    marks: Some("_".to_owned()),
                    ..Default::default()
                },
            ));
            Schema::new(spec).unwrap()
        };
        let caption = underscore_all.node_type("caption").unwrap();
        assert!(caption.allows_mark_type(&underscore_all.mark_type("link").unwrap()));
    }

    #[test]
    fn unknown_mark_in_node_spec_fails() {
        let mut spec = spec();
        spec.nodes.push((
            "caption".to_owned(),
            NodeSpec {
                content: Some("text*".to_owned()),
                marks: Some("sparkle".to_owned()),
                ..Default::default()
            },
        ));
        assert_eq!(
            Schema::new(spec).unwrap_err(),
            SchemaError::UnknownMarkInNode {
                name: "caption".to_owned(),
                mark: "sparkle".to_owned(),
            }
        );
    }

    #[test]
    fn excluded_marks_default_to_self() {
        let mut spec = spec();
        spec.marks.push((
            "shout".to_owned(),
            MarkSpec {
                excludes: Some("em strong".to_owned()),
                ..Default::default()
            },
        ));
        spec.marks.push((
            "quiet".to_owned(),
            MarkSpec {
                excludes: Some("".to_owned()),
                ..Default::default()
            },
        ));
        let s = Schema::new(spec).unwrap();

        let em = s.mark_type("em").unwrap();
        assert!(em.excludes(&em));

        let shout = s.mark_type("shout").unwrap();
        assert!(shout.excludes(&em));
        assert!(shout.excludes(&s.mark_type("strong").unwrap()));
        assert!(!shout.excludes(&shout));
        assert_eq!(shout.excluded().len(), 2);

        let quiet = s.mark_type("quiet").unwrap();
        assert!(!quiet.excludes(&quiet));
    }

    #[test]
    fn check_content_reports_each_failure() {
        let s = schema();
        let doc = s.node_type("doc").unwrap();
        let para = s.node("paragraph", None, Fragment::new(), Vec::new()).unwrap();

        assert_eq!(doc.check_content(&Fragment::from(vec![para.clone()])), Ok(()));
        // empty content does not reach a valid end of "block+"
        assert_eq!(
            doc.check_content(&Fragment::new()),
            Err(ContentCheckError::InvalidEnd("doc".to_owned()))
        );
        // text is no block
        assert_eq!(
            doc.check_content(&Fragment::from(vec![s.text("loose")])),
            Err(ContentCheckError::NoMatch("doc".to_owned()))
        );
        // code_block forbids marks on its children
        let code = s.node_type("code_block").unwrap();
        let marked = s.text("x").with_marks(vec![s.mark("em", None).unwrap()]);
        assert_eq!(
            code.check_content(&Fragment::from(vec![marked])),
            Err(ContentCheckError::MarkNotAllowed {
                mark: "em".to_owned(),
                name: "code_block".to_owned(),
            })
        );
    }

    #[test]
    fn create_validates_content() {
        let s = schema();
        let quote = s.node_type("blockquote").unwrap();
        let para = s.node("paragraph", None, Fragment::new(), Vec::new()).unwrap();

        let node = quote
            .create(None, Vec::new(), Fragment::from(vec![para]))
            .unwrap();
        assert_eq!(node.r#type().name(), "blockquote");

        assert_eq!(
            quote.create(None, Vec::new(), Fragment::new()),
            Err(ContentCheckError::InvalidEnd("blockquote".to_owned()))
        );
    }

    #[test]
    fn schema_keeps_its_spec() {
        let s = schema();
        assert!(s.spec().nodes.iter().any(|(name, _)| name == "doc"));
        assert_eq!(s.spec().top_node.as_deref(), Some("doc"));
    }

    #[test]
    fn content_expressions_share_automata() {
        // paragraph and heading both use "inline*"; both must accept the
        // same sequences (the cache is an implementation detail, equality of
        // behavior is the observable).
        let s = schema();
        let text = Fragment::from(vec![s.text("x")]);
        assert!(s.node_type("paragraph").unwrap().check_content(&text).is_ok());
        assert!(s.node_type("heading").unwrap().check_content(&text).is_ok());
    }
}
