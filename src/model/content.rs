//! The content-expression compiler.
//!
//! A node type's `content` spec is a tiny grammar: one atom (a node type
//! name or a group name) followed by an optional quantifier (`?`, `*`, `+`,
//! `{n}`, `{n,}` or `{n,m}`). The expression is parsed into an [`Expr`]
//! tree, lowered to an NFA with the usual Thompson fragments, and then
//! determinized into the [`ContentMatch`] automaton that validates child
//! sequences.

use super::schema::{NodeType, NodeTypeData, SchemaData};
use super::{util, Fragment};
use displaydoc::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;
use thiserror::Error;

/// Errors from compiling a content expression.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// invalid content expression: {0:?}
    Invalid(String),
    /// unknown node type or group {0:?} in content expression
    UnknownName(String),
}

/// A parsed content expression.
///
/// Type atoms are stored as indices into the schema's node-type table, so
/// the tree carries no references of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Name(usize),
    Choice(Vec<Expr>),
    Opt(Box<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    /// `min` required repetitions; `None` max means unbounded.
    Range(Box<Expr>, usize, Option<usize>),
}

// The full JS implementation parses sequences, alternations and grouping.
// This grammar is deliberately limited to `atom quantifier?`; anything else
// must be rejected outright rather than partially matched.
static CONTENT_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([\w-]+)\s*(\?|\*|\+|\{[^{}]*\})?\s*$").unwrap());

pub(crate) fn parse_expr(
    src: &str,
    nodes: &[NodeTypeData],
    node_index: &HashMap<String, usize>,
) -> Result<Expr, ExprError> {
    let caps = CONTENT_EXPR
        .captures(src)
        .ok_or_else(|| ExprError::Invalid(src.to_owned()))?;

    let atom = parse_atom(&caps[1], nodes, node_index)?;
    let expr = match caps.get(2).map(|m| m.as_str()) {
        None => atom,
        Some("?") => Expr::Opt(Box::new(atom)),
        Some("*") => Expr::Star(Box::new(atom)),
        Some("+") => Expr::Plus(Box::new(atom)),
        Some(braces) => {
            let (min, max) =
                parse_range(braces).ok_or_else(|| ExprError::Invalid(src.to_owned()))?;
            Expr::Range(Box::new(atom), min, max)
        }
    };
    Ok(expr)
}

/// Resolve an atom to a single type or, for group names, a choice over
/// every type that lists the group.
fn parse_atom(
    name: &str,
    nodes: &[NodeTypeData],
    node_index: &HashMap<String, usize>,
) -> Result<Expr, ExprError> {
    let mut exprs: Vec<Expr> = if let Some(&index) = node_index.get(name) {
        vec![Expr::Name(index)]
    } else {
        nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.groups.iter().any(|g| g == name))
            .map(|(index, _)| Expr::Name(index))
            .collect()
    };

    match exprs.len() {
        0 => Err(ExprError::UnknownName(name.to_owned())),
        1 => Ok(exprs.pop().unwrap()),
        _ => Ok(Expr::Choice(exprs)),
    }
}

/// Parse the inside of a `{…}` quantifier. Returns `(min, max)` where a
/// `None` max stands for an unbounded repetition.
fn parse_range(braces: &str) -> Option<(usize, Option<usize>)> {
    let inner = braces.strip_prefix('{')?.strip_suffix('}')?;
    let (min, max) = match inner.split_once(',') {
        None => {
            let n = inner.trim().parse().ok()?;
            (n, Some(n))
        }
        Some((min, "")) => (min.trim().parse().ok()?, None),
        Some((min, max)) => {
            let min = min.trim().parse().ok()?;
            let max: usize = max.trim().parse().ok()?;
            if max == 0 || min > max {
                return None;
            }
            (min, Some(max))
        }
    };
    Some((min, max))
}

/// One NFA edge: a labeled transition on a node type, or an ε-transition.
/// `to` is patched in by `connect` while the fragment is still dangling.
#[derive(Debug, Copy, Clone)]
struct NfaEdge {
    term: Option<usize>,
    to: Option<usize>,
}

/// Thompson-construction scratch space. Dangling edges are addressed as
/// `(node, edge index)` pairs so `connect` can re-target them in place.
struct NfaBuilder {
    nfa: Vec<Vec<NfaEdge>>,
}

type EdgeRef = (usize, usize);

impl NfaBuilder {
    fn node(&mut self) -> usize {
        self.nfa.push(Vec::new());
        self.nfa.len() - 1
    }

    fn edge(&mut self, from: usize, to: Option<usize>, term: Option<usize>) -> EdgeRef {
        self.nfa[from].push(NfaEdge { term, to });
        (from, self.nfa[from].len() - 1)
    }

    fn connect(&mut self, edges: &[EdgeRef], to: usize) {
        for &(node, edge) in edges {
            self.nfa[node][edge].to = Some(to);
        }
    }

    fn compile(&mut self, expr: &Expr, from: usize) -> Vec<EdgeRef> {
        match expr {
            Expr::Name(term) => vec![self.edge(from, None, Some(*term))],
            Expr::Choice(exprs) => {
                let mut out = Vec::new();
                for expr in exprs {
                    out.extend(self.compile(expr, from));
                }
                out
            }
            Expr::Opt(expr) => {
                let mut out = vec![self.edge(from, None, None)];
                out.extend(self.compile(expr, from));
                out
            }
            Expr::Star(expr) => {
                let cycle = self.node();
                self.edge(from, Some(cycle), None);
                let dangling = self.compile(expr, cycle);
                self.connect(&dangling, cycle);
                vec![self.edge(cycle, None, None)]
            }
            Expr::Plus(expr) => {
                let cycle = self.node();
                let dangling = self.compile(expr, from);
                self.connect(&dangling, cycle);
                let dangling = self.compile(expr, cycle);
                self.connect(&dangling, cycle);
                vec![self.edge(cycle, None, None)]
            }
            Expr::Range(expr, min, max) => {
                let mut cur = from;
                for _ in 0..*min {
                    let next = self.node();
                    let dangling = self.compile(expr, cur);
                    self.connect(&dangling, next);
                    cur = next;
                }
                match max {
                    None => {
                        let dangling = self.compile(expr, cur);
                        self.connect(&dangling, cur);
                    }
                    Some(max) => {
                        for _ in *min..*max {
                            let next = self.node();
                            self.edge(cur, Some(next), None);
                            let dangling = self.compile(expr, cur);
                            self.connect(&dangling, next);
                            cur = next;
                        }
                    }
                }
                vec![self.edge(cur, None, None)]
            }
        }
    }
}

fn build_nfa(expr: &Expr) -> Vec<Vec<NfaEdge>> {
    let mut builder = NfaBuilder { nfa: vec![Vec::new()] };
    let dangling = builder.compile(expr, 0);
    let accept = builder.node();
    builder.connect(&dangling, accept);
    builder.nfa
}

/// A determinized content automaton shared by every type compiled from the
/// same expression string.
#[derive(Debug)]
pub(crate) struct Dfa {
    pub(crate) states: Vec<DfaState>,
}

#[derive(Debug)]
pub(crate) struct DfaState {
    pub(crate) valid_end: bool,
    /// `(node type index, next state)` transitions.
    pub(crate) next: Vec<(usize, usize)>,
}

impl Dfa {
    /// The matcher for types without a content expression: accepts only the
    /// empty sequence.
    pub(crate) fn empty() -> Arc<Dfa> {
        static EMPTY: Lazy<Arc<Dfa>> = Lazy::new(|| {
            Arc::new(Dfa {
                states: vec![DfaState {
                    valid_end: true,
                    next: Vec::new(),
                }],
            })
        });
        EMPTY.clone()
    }
}

pub(crate) fn compile_expr(expr: &Expr) -> Dfa {
    let nfa = build_nfa(expr);
    determinize(&nfa)
}

/// Subset construction over the ε-closures computed by [`null_from`].
/// A DFA state is a valid end iff its NFA set contains the accept node.
fn determinize(nfa: &[Vec<NfaEdge>]) -> Dfa {
    let accept = nfa.len() - 1;
    let mut states = Vec::new();
    let mut labeled = HashMap::new();
    let start = null_from(nfa, 0);
    explore(nfa, accept, &start, &mut states, &mut labeled);
    Dfa { states }
}

fn explore(
    nfa: &[Vec<NfaEdge>],
    accept: usize,
    set: &[usize],
    states: &mut Vec<DfaState>,
    labeled: &mut HashMap<String, usize>,
) -> usize {
    let id = states.len();
    states.push(DfaState {
        valid_end: set.contains(&accept),
        next: Vec::new(),
    });
    labeled.insert(join(set), id);

    // Group target ε-closures by transition label, in first-seen order.
    let mut out: Vec<(usize, Vec<usize>)> = Vec::new();
    for &node in set {
        for edge in &nfa[node] {
            let (Some(term), Some(to)) = (edge.term, edge.to) else {
                continue;
            };
            let entry = match out.iter().position(|(t, _)| *t == term) {
                Some(entry) => entry,
                None => {
                    out.push((term, Vec::new()));
                    out.len() - 1
                }
            };
            for target in null_from(nfa, to) {
                if !out[entry].1.contains(&target) {
                    out[entry].1.push(target);
                }
            }
        }
    }

    for (term, mut set) in out {
        set.sort_unstable();
        let next = match labeled.get(&join(&set)) {
            Some(&next) => next,
            None => explore(nfa, accept, &set, states, labeled),
        };
        states[id].next.push((term, next));
    }
    id
}

/// The sorted ε-closure of `node`. Nodes with a single outgoing ε-edge are
/// skipped over entirely, the way the reference determinizer prunes them.
fn null_from(nfa: &[Vec<NfaEdge>], node: usize) -> Vec<usize> {
    let mut result = Vec::new();
    scan(nfa, node, &mut result);
    result.sort_unstable();
    result
}

fn scan(nfa: &[Vec<NfaEdge>], node: usize, result: &mut Vec<usize>) {
    let edges = &nfa[node];
    if edges.len() == 1 && edges[0].term.is_none() {
        if let Some(to) = edges[0].to {
            scan(nfa, to, result);
            return;
        }
    }
    result.push(node);
    for edge in edges {
        if edge.term.is_none() {
            if let Some(to) = edge.to {
                if !result.contains(&to) {
                    scan(nfa, to, result);
                }
            }
        }
    }
}

fn join(set: &[usize]) -> String {
    let mut out = String::new();
    for (i, state) in set.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&state.to_string());
    }
    out
}

/// A match state of a node type's content expression; a pointer into the
/// schema's content-validation automaton.
///
/// Use it to find out whether further content may appear at some point in a
/// child sequence, and whether that point is a valid end for the parent.
#[derive(Clone)]
pub struct ContentMatch {
    pub(crate) schema: Arc<SchemaData>,
    pub(crate) dfa: Arc<Dfa>,
    pub(crate) state: usize,
}

impl ContentMatch {
    fn state(&self) -> &DfaState {
        &self.dfa.states[self.state]
    }

    fn at(&self, state: usize) -> ContentMatch {
        ContentMatch {
            schema: self.schema.clone(),
            dfa: self.dfa.clone(),
            state,
        }
    }

    /// True when this match state represents a valid end of the node.
    pub fn valid_end(&self) -> bool {
        self.state().valid_end
    }

    /// Match a node type, returning a match after that node if successful.
    pub fn match_type(&self, r#type: &NodeType) -> Option<ContentMatch> {
        self.state()
            .next
            .iter()
            .find(|(term, _)| self.schema.nodes[*term].name == r#type.name())
            .map(|(_, next)| self.at(*next))
    }

    /// Try to match a fragment. Returns the resulting match when successful.
    pub fn match_fragment(&self, fragment: &Fragment) -> Option<ContentMatch> {
        self.match_fragment_range(fragment, ..)
    }

    /// Try to match a sub-range of a fragment's children.
    pub fn match_fragment_range<R: RangeBounds<usize>>(
        &self,
        fragment: &Fragment,
        range: R,
    ) -> Option<ContentMatch> {
        let (start, end) = util::bounds(&range, fragment.child_count());

        let mut test = self.clone();
        for child in &fragment.children()[start..end] {
            test = test.match_type(child.r#type())?;
        }
        Some(test)
    }

    /// True when the two automata accept at least one common first child,
    /// which is what joining two nodes of these types requires.
    pub fn compatible(&self, other: &ContentMatch) -> bool {
        self.state().next.iter().any(|(a, _)| {
            other
                .state()
                .next
                .iter()
                .any(|(b, _)| self.schema.nodes[*a].name == other.schema.nodes[*b].name)
        })
    }

    /// True when the first transition out of this state leads to an inline
    /// type, or when there are no transitions at all.
    pub fn inline_content(&self) -> bool {
        match self.state().next.first() {
            Some(&(term, _)) => !self.schema.nodes[term].block,
            None => true,
        }
    }
}

impl fmt::Debug for ContentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .state()
            .next
            .iter()
            .map(|(term, _)| self.schema.nodes[*term].name.as_str())
            .collect();
        f.debug_struct("ContentMatch")
            .field("next", &names)
            .field("valid_end", &self.valid_end())
            .finish()
    }
}
