use std::collections::BTreeSet;

use serde_json::Value;
use tracing::trace;

use crate::core::Node;
use crate::error::ApplyError;
use crate::helpers::{find_ancestor, find_root_list, is_list, is_list_item, is_paragraph_or_heading};
use crate::ops::Transaction;
use crate::traverse::traverse_in_range_recursively;

pub const LIST_MIN_INDENTATION: i64 = 40;
pub const BLOCK_MIN_INDENTATION: i64 = 0;

pub fn min_indentation(node: &Node) -> i64 {
    if is_list(node) {
        LIST_MIN_INDENTATION
    } else {
        BLOCK_MIN_INDENTATION
    }
}

pub fn indentation_of(node: &Node) -> i64 {
    node.attr("indentation")
        .and_then(Value::as_i64)
        .unwrap_or_else(|| min_indentation(node))
}

fn inside_list_item(doc: &Node, pos: usize) -> bool {
    doc.resolve(pos).is_ok_and(|resolved| {
        find_ancestor(&resolved, |ancestor| is_list_item(ancestor.node)).is_some()
    })
}

#[derive(Debug, Default)]
struct BlockTargets {
    blocks: Vec<usize>,
    root_lists: BTreeSet<usize>,
}

fn collect_targets(doc: &Node, from: usize, to: usize) -> BlockTargets {
    let mut targets = BlockTargets::default();
    doc.nodes_between(from, to.max(from), |node, pos, _, _| {
        if is_list(node) {
            if let Some((root, _)) = find_root_list(doc, pos + 1) {
                targets.root_lists.insert(root);
            }
            return true;
        }
        if is_paragraph_or_heading(node) {
            if inside_list_item(doc, pos) {
                if let Some((root, _)) = find_root_list(doc, pos + 1) {
                    targets.root_lists.insert(root);
                }
            } else {
                targets.blocks.push(pos);
            }
            return false;
        }
        true
    });
    targets
}

/// Shifts the indentation of the selected blocks by `delta`. Lists are
/// indented as a whole through their outermost list.
pub fn set_indentation(tr: &mut Transaction, delta: i64) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let targets = collect_targets(&doc, selection.from(), selection.to());

    let mut changed = false;
    for pos in targets.blocks.iter().copied().chain(targets.root_lists.iter().copied()) {
        let Some(node) = doc.node_at(pos) else {
            continue;
        };
        let current = indentation_of(node);
        let next = (current + delta).max(min_indentation(node));
        if next != current {
            tr.set_node_attribute(pos, "indentation", next)?;
            changed = true;
        }
    }
    trace!(delta, changed, "indentation applied");
    Ok(changed)
}

/// Sets `textAlign` on the selected paragraphs and headings. When all of
/// them already have `align`, they go back to left.
pub fn toggle_text_align(tr: &mut Transaction, align: &str) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let mut blocks = Vec::new();
    doc.nodes_between(selection.from(), selection.to().max(selection.from()), |node, pos, _, _| {
        if is_paragraph_or_heading(node) {
            blocks.push((pos, node));
            return false;
        }
        true
    });
    if blocks.is_empty() {
        return Ok(false);
    }

    let all_set = blocks
        .iter()
        .all(|(_, node)| node.attr_str("textAlign").unwrap_or("left") == align);
    let target = if all_set { "left" } else { align };
    for (pos, _) in blocks {
        tr.set_node_attribute(pos, "textAlign", target)?;
    }
    Ok(true)
}

fn set_direction_on_lists(
    tr: &mut Transaction,
    doc: &Node,
    root_pos: usize,
    root: &Node,
    dir: &Value,
) -> Result<(), ApplyError> {
    tr.set_node_attribute(root_pos, "textDirection", dir.clone())?;
    let end = root_pos + root.node_size();
    let mut nested = Vec::new();
    traverse_in_range_recursively(doc, root_pos, end, false, |ctx| {
        if ctx.pos > root_pos && ctx.pos < end && is_list(ctx.node) {
            nested.push(ctx.pos);
        }
    });
    for pos in nested {
        tr.set_node_attribute(pos, "textDirection", dir.clone())?;
    }
    Ok(())
}

/// Sets the text direction of the selected blocks. Lists get it on every
/// nesting level below their outermost list.
pub fn set_text_direction(tr: &mut Transaction, dir: Option<&str>) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let targets = collect_targets(&doc, selection.from(), selection.to());
    if targets.blocks.is_empty() && targets.root_lists.is_empty() {
        return Ok(false);
    }
    let value = dir.map_or(Value::Null, Value::from);

    for &pos in &targets.blocks {
        tr.set_node_attribute(pos, "textDirection", value.clone())?;
    }
    for &root_pos in &targets.root_lists {
        if let Some(root) = doc.node_at(root_pos) {
            set_direction_on_lists(tr, &doc, root_pos, root, &value)?;
        }
    }
    trace!(?dir, blocks = targets.blocks.len(), lists = targets.root_lists.len(), "direction set");
    Ok(true)
}

pub fn toggle_text_direction(tr: &mut Transaction, dir: &str) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let targets = collect_targets(&doc, selection.from(), selection.to());
    let all_set = targets
        .blocks
        .iter()
        .chain(targets.root_lists.iter())
        .filter_map(|&pos| doc.node_at(pos))
        .all(|node| node.attr_str("textDirection") == Some(dir));
    if all_set {
        set_text_direction(tr, None)
    } else {
        set_text_direction(tr, Some(dir))
    }
}
