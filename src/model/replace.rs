//! The replace engine: a multi-depth splice that merges an open-ended
//! slice into a document while preserving schema validity.

use super::{ContentCheckError, Fragment, Node, ResolveErr, ResolvedPos, Slice};
use displaydoc::Display;
use std::borrow::Cow;
use thiserror::Error;

/// An error that can occur when replacing a slice.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ReplaceError {
    /// inserted content deeper than insertion position
    InsertTooDeep,
    /// inconsistent open depths
    InconsistentOpenDepths {
        /// Depth at the start
        from_depth: usize,
        /// How many nodes are "open" at the start
        open_start: usize,
        /// Depth at the end
        to_depth: usize,
        /// How many nodes are "open" at the end
        open_end: usize,
    },
    /// could not resolve an index
    Resolve(#[from] ResolveErr),
    /// can't join incompatible nodes ({sub} onto {main})
    CannotJoin {
        /// The node type being joined on
        sub: String,
        /// The node type joined onto
        main: String,
    },
    /// invalid content while closing a node
    Content(#[from] ContentCheckError),
}

pub(crate) fn replace(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ReplaceError> {
    if slice.open_start > rp_from.depth() {
        Err(ReplaceError::InsertTooDeep)
    } else if rp_from.depth() - slice.open_start != rp_to.depth() - slice.open_end {
        Err(ReplaceError::InconsistentOpenDepths {
            from_depth: rp_from.depth(),
            open_start: slice.open_start,
            to_depth: rp_to.depth(),
            open_end: slice.open_end,
        })
    } else {
        replace_outer(rp_from, rp_to, slice, 0)
    }
}

fn replace_outer(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ReplaceError> {
    let index = rp_from.index(depth);
    let node = rp_from.node(depth);

    if index == rp_to.index(depth) && depth < rp_from.depth() - slice.open_start {
        // Both endpoints lie in the same child, and no node is open yet at
        // this level: splice deeper and patch the child in place.
        let inner = replace_outer(rp_from, rp_to, slice, depth + 1)?;
        Ok(node.copy(|c| c.replace_child(index, inner)))
    } else if slice.content.size() == 0 {
        // Pure deletion: merge the two sides.
        let content = replace_two_way(rp_from, rp_to, depth)?;
        close(node, content)
    } else if slice.open_start == 0
        && slice.open_end == 0
        && rp_from.depth() == depth
        && rp_to.depth() == depth
    {
        // Flat slice at exactly this depth: plain cut-and-append.
        let parent = rp_from.parent();
        let content = parent.content();
        let new_content = content
            .cut(0..rp_from.parent_offset())
            .append(slice.content.clone())
            .append(content.cut(rp_to.parent_offset()..));
        close(parent, new_content)
    } else {
        let (scaffold, start, end) = prepare_slice_for_replace(slice, rp_from);
        let rp_start = scaffold.resolve(start)?;
        let rp_end = scaffold.resolve(end)?;
        let content = replace_three_way(rp_from, &rp_start, &rp_end, rp_to, depth)?;
        close(node, content)
    }
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    if sub.r#type().compatible_content(main.r#type()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            sub: sub.r#type().name().to_owned(),
            main: main.r#type().name().to_owned(),
        })
    }
}

fn joinable<'a>(
    rp_before: &ResolvedPos<'a>,
    rp_after: &ResolvedPos<'a>,
    depth: usize,
) -> Result<&'a Node, ReplaceError> {
    let node = rp_before.node(depth);
    check_join(node, rp_after.node(depth))?;
    Ok(node)
}

fn close(node: &Node, content: Fragment) -> Result<Node, ReplaceError> {
    Ok(node.close(content)?)
}

/// Push a child onto the accumulated content, joining adjacent text nodes
/// that share their markup.
fn add_node(child: Cow<Node>, target: &mut Vec<Node>) {
    if let Node::Text(c_text) = child.as_ref() {
        if let Some(last) = target.last_mut() {
            if let Some(l_text) = c_text.same_markup(last) {
                let joined = c_text.with_text(l_text.text.join(&c_text.text));
                *last = Node::Text(joined);
                return;
            }
        }
    }
    target.push(child.into_owned());
}

/// Emit the children of the node at `depth` between the given boundary
/// positions, splintering a text node when a boundary falls inside it.
/// A missing start means "from the first child", a missing end "to the
/// last"; both boundaries resolve to the same node at this depth.
fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let node = start
        .or(end)
        .expect("a range needs at least one boundary")
        .node(depth);
    let mut start_index = 0;

    let end_index = match end {
        Some(rp_end) => rp_end.index(depth),
        None => node.child_count(),
    };

    if let Some(rp_start) = start {
        start_index = rp_start.index(depth);
        if rp_start.depth() > depth {
            start_index += 1;
        } else if rp_start.text_offset() > 0 {
            add_node(
                rp_start.node_after().expect("text offset implies a child"),
                target,
            );
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(Cow::Borrowed(node.child(i)), target);
    }
    if let Some(rp_end) = end {
        if rp_end.depth() == depth && rp_end.text_offset() > 0 {
            add_node(
                rp_end.node_before().expect("text offset implies a child"),
                target,
            );
        }
    }
}

fn replace_three_way(
    rp_from: &ResolvedPos,
    rp_start: &ResolvedPos,
    rp_end: &ResolvedPos,
    rp_to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let open_start = if rp_from.depth() > depth {
        Some(joinable(rp_from, rp_start, depth + 1)?)
    } else {
        None
    };
    let open_end = if rp_to.depth() > depth {
        Some(joinable(rp_end, rp_to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(rp_from), depth, &mut content);
    match (open_start, open_end) {
        (Some(os), Some(oe)) if rp_start.index(depth) == rp_end.index(depth) => {
            // The slice is itself thin at this depth: keep descending with
            // both sides open.
            check_join(os, oe)?;
            let inner = replace_three_way(rp_from, rp_start, rp_end, rp_to, depth + 1)?;
            let closed = close(os, inner)?;
            add_node(Cow::Owned(closed), &mut content);
        }
        (open_start, open_end) => {
            if let Some(os) = open_start {
                let inner = replace_two_way(rp_from, rp_start, depth + 1)?;
                let closed = close(os, inner)?;
                add_node(Cow::Owned(closed), &mut content);
            }
            add_range(Some(rp_start), Some(rp_end), depth, &mut content);
            if let Some(oe) = open_end {
                let inner = replace_two_way(rp_end, rp_to, depth + 1)?;
                let closed = close(oe, inner)?;
                add_node(Cow::Owned(closed), &mut content);
            }
        }
    }
    add_range(Some(rp_to), None, depth, &mut content);
    Ok(Fragment::from(content))
}

fn replace_two_way(
    rp_from: &ResolvedPos,
    rp_to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let mut content = Vec::new();
    add_range(None, Some(rp_from), depth, &mut content);
    if rp_from.depth() > depth {
        let node = joinable(rp_from, rp_to, depth + 1)?;
        let inner = replace_two_way(rp_from, rp_to, depth + 1)?;
        let closed = close(node, inner)?;
        add_node(Cow::Owned(closed), &mut content);
    }
    add_range(Some(rp_to), None, depth, &mut content);
    Ok(Fragment::from(content))
}

/// Wrap the slice content in copies of the ancestors it is open into, so
/// that its boundary positions can be resolved like document positions.
fn prepare_slice_for_replace(slice: &Slice, rp_along: &ResolvedPos) -> (Node, usize, usize) {
    let extra = rp_along.depth() - slice.open_start;
    let parent = rp_along.node(extra);
    let mut node = parent.copy(|_| slice.content.clone());
    for i in (0..extra).rev() {
        let wrapped = Fragment::from(node);
        node = rp_along.node(i).copy(|_| wrapped);
    }
    let start = slice.open_start + extra;
    let end = node.content().size() - slice.open_end - extra;
    (node, start, end)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{blockquote, bullet_list, doc, h1, li, p_text, schema};
    use super::super::Node;
    use super::ReplaceError;
    use pretty_assertions::assert_eq;
    use std::ops::Range;

    fn rpl(
        (doc, range): (Node, Range<usize>),
        insert: Option<(Node, Range<usize>)>,
        expected: Node,
    ) {
        let slice = insert
            .map(|(n, r)| n.slice(r, false).unwrap())
            .unwrap_or_default();
        assert_eq!(doc.replace(range, &slice), Ok(expected));
    }

    fn bad(
        (doc, range): (Node, Range<usize>),
        insert: Option<(Node, Range<usize>)>,
        expected: ReplaceError,
    ) {
        let slice = insert
            .map(|(n, r)| n.slice(r, false).unwrap())
            .unwrap_or_default();
        assert_eq!(doc.replace(range, &slice), Err(expected));
    }

    #[test]
    fn joins_on_delete() {
        let t = doc(vec![p_text("one"), p_text("two")]);
        let e = doc(vec![p_text("onwo")]);
        rpl((t, 3..7), None, e);
    }

    #[test]
    fn merges_matching_blocks() {
        let t = doc(vec![p_text("one"), p_text("two")]);
        let i = doc(vec![p_text("xxxx"), p_text("yyyy")]);
        let e = doc(vec![p_text("onxx"), p_text("yywo")]);
        rpl((t, 3..7), Some((i, 3..9)), e);
    }

    #[test]
    fn merges_when_adding_text() {
        let t = doc(vec![p_text("one"), p_text("two")]);
        let i = doc(vec![p_text("H")]);
        let e = doc(vec![p_text("onHwo")]);
        rpl((t, 3..7), Some((i, 1..2)), e);
    }

    #[test]
    fn can_insert_text() {
        let t = doc(vec![p_text("before"), p_text("one"), p_text("after")]);
        let i = doc(vec![p_text("H")]);
        let e = doc(vec![p_text("before"), p_text("onHe"), p_text("after")]);
        rpl((t, 11..11), Some((i, 1..2)), e);
    }

    #[test]
    fn doesnt_merge_non_matching_blocks() {
        let t = doc(vec![p_text("one"), p_text("two")]);
        let i = doc(vec![h1("H")]);
        let e = doc(vec![p_text("onHwo")]);
        rpl((t, 3..7), Some((i, 1..2)), e);
    }

    #[test]
    fn can_merge_a_nested_node() {
        let t = doc(vec![blockquote(vec![blockquote(vec![
            p_text("one"),
            p_text("two"),
        ])])]);
        let i = doc(vec![p_text("H")]);
        let e = doc(vec![blockquote(vec![blockquote(vec![p_text("onHwo")])])]);
        rpl((t, 5..9), Some((i, 1..2)), e);
    }

    #[test]
    fn can_replace_within_a_block() {
        let t = doc(vec![blockquote(vec![p_text("abcd")])]);
        let i = doc(vec![p_text("xyz")]);
        let e = doc(vec![blockquote(vec![p_text("ayd")])]);
        rpl((t, 3..5), Some((i, 2..3)), e);
    }

    #[test]
    fn can_insert_a_lopsided_slice() {
        let t = doc(vec![blockquote(vec![blockquote(vec![
            p_text("one"),
            p_text("two"),
            p_text("three"),
        ])])]);
        let i = doc(vec![blockquote(vec![
            p_text("aaaa"),
            p_text("bb"),
            p_text("cc"),
            p_text("dd"),
        ])]);
        let e = doc(vec![blockquote(vec![blockquote(vec![
            p_text("onaa"),
            p_text("bb"),
            p_text("cc"),
            p_text("three"),
        ])])]);
        rpl((t, 5..12), Some((i, 4..15)), e);
    }

    #[test]
    fn can_insert_a_deep_lopsided_slice() {
        let t = doc(vec![blockquote(vec![
            blockquote(vec![p_text("one"), p_text("two"), p_text("three")]),
            p_text("x"),
        ])]);
        let i = doc(vec![
            blockquote(vec![p_text("aaaa"), p_text("bb"), p_text("cc")]),
            p_text("dd"),
        ]);
        let e = doc(vec![blockquote(vec![
            blockquote(vec![p_text("onaa"), p_text("bb"), p_text("cc")]),
            p_text("x"),
        ])]);
        rpl((t, 5..20), Some((i, 4..16)), e);
    }

    #[test]
    fn can_merge_multiple_levels() {
        let t = doc(vec![
            blockquote(vec![blockquote(vec![p_text("hello")])]),
            blockquote(vec![blockquote(vec![p_text("a")])]),
        ]);
        let e = doc(vec![blockquote(vec![blockquote(vec![p_text("hella")])])]);
        rpl((t, 7..14), None, e);
    }

    #[test]
    fn can_merge_multiple_levels_while_inserting() {
        let t = doc(vec![
            blockquote(vec![blockquote(vec![p_text("hello")])]),
            blockquote(vec![blockquote(vec![p_text("a")])]),
        ]);
        let i = doc(vec![p_text("i")]);
        let e = doc(vec![blockquote(vec![blockquote(vec![p_text("hellia")])])]);
        rpl((t, 7..14), Some((i, 1..2)), e);
    }

    #[test]
    fn can_insert_a_split() {
        let t = doc(vec![p_text("foobar")]);
        let i = doc(vec![p_text("x"), p_text("y")]);
        let e = doc(vec![p_text("foox"), p_text("ybar")]);
        rpl((t, 4..4), Some((i, 1..5)), e);
    }

    #[test]
    fn can_insert_a_deep_split() {
        let t = doc(vec![blockquote(vec![p_text("fooxbar")])]);
        let i = doc(vec![
            blockquote(vec![p_text("x")]),
            blockquote(vec![p_text("y")]),
        ]);
        let e = doc(vec![
            blockquote(vec![p_text("foox")]),
            blockquote(vec![p_text("ybar")]),
        ]);
        rpl((t, 5..6), Some((i, 2..8)), e);
    }

    #[test]
    fn can_add_a_split_one_level_up() {
        let t = doc(vec![blockquote(vec![p_text("foou"), p_text("vbar")])]);
        let i = doc(vec![
            blockquote(vec![p_text("x")]),
            blockquote(vec![p_text("y")]),
        ]);
        let e = doc(vec![
            blockquote(vec![p_text("foox")]),
            blockquote(vec![p_text("ybar")]),
        ]);
        rpl((t, 5..9), Some((i, 2..8)), e);
    }

    #[test]
    fn keeps_the_node_type_of_the_left_node() {
        let t = doc(vec![h1("foobar")]);
        let i = doc(vec![p_text("foobaz")]);
        let e = doc(vec![h1("foobaz")]);
        rpl((t, 4..8), Some((i, 4..8)), e);
    }

    #[test]
    fn keeps_the_node_type_even_when_empty() {
        let t = doc(vec![h1("bar")]);
        let i = doc(vec![p_text("foobaz")]);
        let e = doc(vec![h1("baz")]);
        rpl((t, 1..5), Some((i, 4..8)), e);
    }

    #[test]
    fn doesnt_allow_the_left_side_to_be_too_deep() {
        let t = doc(vec![p_text("")]);
        let i = doc(vec![blockquote(vec![p_text("")])]);
        bad((t, 1..1), Some((i, 2..4)), ReplaceError::InsertTooDeep);
    }

    #[test]
    fn doesnt_allow_a_depth_mismatch() {
        let t = doc(vec![p_text("")]);
        let i = doc(vec![p_text("")]);
        bad(
            (t, 1..1),
            Some((i, 0..1)),
            ReplaceError::InconsistentOpenDepths {
                from_depth: 1,
                open_start: 0,
                to_depth: 1,
                open_end: 1,
            },
        );
    }

    #[test]
    fn rejects_a_bad_fit() {
        let s = schema();
        let t = s
            .node("doc", None, super::Fragment::new(), Vec::new())
            .unwrap();
        let i = doc(vec![p_text("foo")]);
        bad(
            (t, 0..0),
            Some((i, 1..4)),
            ReplaceError::Content(super::ContentCheckError::NoMatch("doc".to_owned())),
        );
    }

    #[test]
    fn rejects_unjoinable_content() {
        let t = doc(vec![bullet_list(vec![li(vec![p_text("a")])])]);
        let i = doc(vec![p_text("foo")]);
        bad(
            (t, 6..7),
            Some((i, 4..5)),
            ReplaceError::CannotJoin {
                sub: "paragraph".to_owned(),
                main: "bullet_list".to_owned(),
            },
        );
    }

    #[test]
    fn rejects_an_unjoinable_delete() {
        let t = doc(vec![
            blockquote(vec![p_text("a")]),
            bullet_list(vec![li(vec![p_text("b")])]),
        ]);
        bad(
            (t, 4..6),
            None,
            ReplaceError::CannotJoin {
                sub: "bullet_list".to_owned(),
                main: "blockquote".to_owned(),
            },
        );
    }

    #[test]
    fn checks_content_validity() {
        let s = schema();
        let t = doc(vec![blockquote(vec![p_text("hi")])]);
        // a blockquote that (invalidly) holds bare text
        let i = s
            .node(
                "doc",
                None,
                super::Fragment::from(
                    s.node(
                        "blockquote",
                        None,
                        super::Fragment::from(s.text("hi")),
                        Vec::new(),
                    )
                    .unwrap(),
                ),
                Vec::new(),
            )
            .unwrap();
        bad(
            (t, 1..6),
            Some((i, 3..4)),
            ReplaceError::Content(super::ContentCheckError::InvalidEnd(
                "blockquote".to_owned(),
            )),
        );
    }

    #[test]
    fn originals_stay_untouched() {
        let t = doc(vec![p_text("one"), p_text("two")]);
        let before = serde_json::to_value(&t).unwrap();
        let slice = t.slice(3..7, false).unwrap();
        let _ = t.replace(3..7, &slice).unwrap();
        assert_eq!(serde_json::to_value(&t).unwrap(), before);
    }

    #[test]
    fn reinserting_a_slice_restores_the_document() {
        let t = doc(vec![
            p_text("one"),
            blockquote(vec![p_text("two"), p_text("three")]),
        ]);
        for (from, to) in [(0, 0), (1, 3), (3, 7), (6, 10), (5, 16), (0, 17)] {
            let slice = t.slice(from..to, false).unwrap();
            let replaced = t.replace(from..to, &slice).unwrap();
            assert_eq!(replaced, t, "replace {from}..{to} changed the document");
        }
    }
}
