use serde_json::Value;

use crate::core::{Attrs, Mark, Node, ResolvedPos, Selection};
use crate::editor::EditorState;
use crate::schema::Schema;

pub fn is_paragraph_or_heading(node: &Node) -> bool {
    node.kind == "paragraph" || node.kind == "heading"
}

pub fn is_list(node: &Node) -> bool {
    node.kind == "bulletList" || node.kind == "orderedList"
}

pub fn is_list_item(node: &Node) -> bool {
    node.kind == "listItem"
}

pub fn first_text_pos(doc: &Node, schema: &Schema) -> Option<usize> {
    if schema.is_textblock(&doc.kind) {
        return Some(0);
    }
    let mut found = None;
    doc.descendants(|node, pos, _, _| {
        if found.is_some() {
            return false;
        }
        if schema.is_textblock(&node.kind) {
            found = Some(pos + 1);
            return false;
        }
        true
    });
    found
}

pub fn last_text_pos(doc: &Node, schema: &Schema) -> Option<usize> {
    if schema.is_textblock(&doc.kind) {
        return Some(doc.content_size());
    }
    let mut found = None;
    doc.descendants(|node, pos, _, _| {
        if schema.is_textblock(&node.kind) {
            found = Some(pos + 1 + node.content_size());
            return false;
        }
        true
    });
    found
}

/// The closest position inside a text block: `pos` itself when it already
/// is one, else the next block start, else the last block end.
pub fn near_text_pos(doc: &Node, schema: &Schema, pos: usize) -> usize {
    let pos = pos.min(doc.content_size());
    let inside = doc
        .resolve(pos)
        .is_ok_and(|resolved| schema.is_textblock(&resolved.parent().kind));
    if inside {
        return pos;
    }
    let mut next = None;
    doc.descendants(|node, start, _, _| {
        if next.is_some() {
            return false;
        }
        if schema.is_textblock(&node.kind) {
            if start + 1 >= pos {
                next = Some(start + 1);
            }
            return false;
        }
        true
    });
    next.or_else(|| last_text_pos(doc, schema)).unwrap_or(pos)
}

pub fn normalize_selection(doc: &Node, schema: &Schema, selection: Selection) -> Selection {
    Selection::new(
        near_text_pos(doc, schema, selection.anchor),
        near_text_pos(doc, schema, selection.head),
    )
}

#[derive(Debug, Clone, Copy)]
pub struct Ancestor<'a> {
    pub node: &'a Node,
    pub pos: usize,
    pub depth: usize,
    pub parent: &'a Node,
}

/// Walks from the innermost ancestor of `resolved` outwards and returns the
/// first one matching `predicate`. The document itself is never returned.
pub fn find_ancestor<'a>(
    resolved: &ResolvedPos<'a>,
    mut predicate: impl FnMut(&Ancestor<'a>) -> bool,
) -> Option<Ancestor<'a>> {
    for depth in (1..=resolved.depth()).rev() {
        let ancestor = Ancestor {
            node: resolved.node(depth),
            pos: resolved.before(depth)?,
            depth,
            parent: resolved.node(depth - 1),
        };
        if predicate(&ancestor) {
            return Some(ancestor);
        }
    }
    None
}

/// The outermost list around `pos`: the first list, walking up, whose
/// parent is not a list item.
pub fn find_root_list(doc: &Node, pos: usize) -> Option<(usize, &Node)> {
    let resolved = doc.resolve(pos).ok()?;
    find_ancestor(&resolved, |ancestor| {
        is_list(ancestor.node) && !is_list_item(ancestor.parent)
    })
    .map(|ancestor| (ancestor.pos, ancestor.node))
}

pub fn range_has_mark(doc: &Node, from: usize, to: usize, kind: &str) -> bool {
    let mut found = false;
    if to > from {
        doc.nodes_between(from, to, |node, _, _, _| {
            if node.has_mark(kind) {
                found = true;
            }
            !found
        });
    }
    found
}

pub fn object_includes(attrs: &Attrs, expected: &Attrs) -> bool {
    expected
        .iter()
        .all(|(key, value)| attrs.get(key).is_some_and(|actual| actual == value))
}

fn attrs_of(value: Option<&Value>) -> Attrs {
    match value {
        Some(Value::Object(map)) => map.clone().into_iter().collect(),
        _ => Attrs::new(),
    }
}

pub fn is_node_active(state: &EditorState, kind: Option<&str>, attrs: &Attrs) -> bool {
    let (from, to) = (state.selection.from(), state.selection.to());
    let mut ranges = Vec::new();
    state.doc.nodes_between(from, to.max(from), |node, pos, _, _| {
        if !node.is_text() {
            ranges.push((node, from.max(pos), to.min(pos + node.node_size())));
        }
        true
    });
    let matched = ranges
        .into_iter()
        .filter(|(node, _, _)| kind.is_none_or(|kind| node.kind == kind))
        .filter(|(node, _, _)| object_includes(&node.attrs, attrs));
    if state.selection.is_empty() {
        return matched.count() > 0;
    }
    let covered: usize = matched.map(|(_, lo, hi)| hi.saturating_sub(lo)).sum();
    covered >= to - from
}

pub fn is_mark_active(state: &EditorState, kind: Option<&str>, attrs: &Attrs) -> bool {
    let schema = state.schema();
    if state.selection.is_empty() {
        let marks = state.cursor_marks();
        return marks
            .iter()
            .filter(|mark| kind.is_none_or(|kind| mark.kind == kind))
            .any(|mark| object_includes(&mark.attrs, attrs));
    }

    let (from, to) = (state.selection.from(), state.selection.to());
    let mut selection_range = 0;
    let mut mark_ranges: Vec<(&Mark, usize, usize)> = Vec::new();
    state.doc.nodes_between(from, to, |node, pos, _, _| {
        if !node.is_text() && node.marks.is_empty() {
            return true;
        }
        let lo = from.max(pos);
        let hi = to.min(pos + node.node_size());
        selection_range += hi - lo;
        for mark in &node.marks {
            mark_ranges.push((mark, lo, hi));
        }
        true
    });
    if selection_range == 0 {
        return false;
    }

    let matched: usize = mark_ranges
        .iter()
        .filter(|(mark, _, _)| kind.is_none_or(|kind| mark.kind == kind))
        .filter(|(mark, _, _)| object_includes(&mark.attrs, attrs))
        .map(|(_, lo, hi)| hi - lo)
        .sum();
    let excluded: usize = mark_ranges
        .iter()
        .filter(|(mark, _, _)| match kind {
            None => true,
            Some(kind) => mark.kind != kind && schema.excludes(&mark.kind, kind),
        })
        .map(|(_, lo, hi)| hi - lo)
        .sum();
    let range = if matched > 0 { matched + excluded } else { matched };
    range >= selection_range
}

pub fn is_active(state: &EditorState, name: Option<&str>, attrs: Option<&Value>) -> bool {
    let attrs = attrs_of(attrs);
    let schema = state.schema();
    match name {
        None => is_node_active(state, None, &attrs) || is_mark_active(state, None, &attrs),
        Some(name) if schema.has_node(name) => is_node_active(state, Some(name), &attrs),
        Some(name) if schema.has_mark(name) => is_mark_active(state, Some(name), &attrs),
        Some(_) => false,
    }
}

pub fn get_node_attributes(state: &EditorState, kind: &str) -> Attrs {
    let Ok(resolved) = state.doc.resolve(state.selection.from()) else {
        return Attrs::new();
    };
    (0..=resolved.depth())
        .rev()
        .map(|depth| resolved.node(depth))
        .find(|node| node.kind == kind)
        .map(|node| node.attrs.clone())
        .unwrap_or_default()
}

pub fn get_mark_attributes(state: &EditorState, kind: &str) -> Attrs {
    let (from, to) = (state.selection.from(), state.selection.to());
    if state.selection.is_empty() {
        return state
            .cursor_marks()
            .iter()
            .find(|mark| mark.kind == kind)
            .map(|mark| mark.attrs.clone())
            .unwrap_or_default();
    }
    let mut found = None;
    state.doc.nodes_between(from, to, |node, _, _, _| {
        if found.is_none() {
            found = node.marks.iter().find(|mark| mark.kind == kind).cloned();
        }
        found.is_none()
    });
    found.map(|mark| mark.attrs).unwrap_or_default()
}

pub fn get_attributes(state: &EditorState, name: &str) -> Attrs {
    let schema = state.schema();
    if schema.has_node(name) {
        get_node_attributes(state, name)
    } else if schema.has_mark(name) {
        get_mark_attributes(state, name)
    } else {
        Attrs::new()
    }
}
