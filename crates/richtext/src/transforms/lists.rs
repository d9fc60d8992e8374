use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::core::{Attrs, Node, Selection, split_inline};
use crate::error::{ApplyError, SchemaError};
use crate::helpers::{find_root_list, is_list, is_list_item, is_paragraph_or_heading};
use crate::ops::{Op, Path, StepMap, Transaction};
use crate::traverse::traverse_in_range_recursively;

const LIST_ITEM: &str = "listItem";

#[derive(Debug, Clone, PartialEq)]
struct ItemRange {
    list_path: Path,
    list_depth: usize,
    start: usize,
    end: usize,
}

fn item_range(doc: &Node, from: usize, to: usize) -> Option<ItemRange> {
    let start_pos = doc.resolve(from).ok()?;
    let item_depth = (2..=start_pos.depth())
        .rev()
        .find(|&depth| is_list_item(start_pos.node(depth)) && is_list(start_pos.node(depth - 1)))?;
    let list_depth = item_depth - 1;
    let list_path = start_pos.path_to(list_depth);
    let start = start_pos.index(list_depth);

    let end_pos = doc.resolve(to).ok()?;
    let end = if end_pos.depth() > list_depth && end_pos.path_to(list_depth) == list_path {
        end_pos.index(list_depth) + 1
    } else {
        start + 1
    };
    Some(ItemRange {
        list_path,
        list_depth,
        start,
        end: end.max(start + 1),
    })
}

fn node_at<'a>(doc: &'a Node, path: &[usize]) -> Result<&'a Node, ApplyError> {
    doc.node_at_path(path)
        .ok_or_else(|| ApplyError::path(path, "no such node"))
}

fn check_content(tr: &Transaction, kind: &str, content: &[Node]) -> Result<(), ApplyError> {
    if tr.schema().valid_content(kind, content) {
        Ok(())
    } else {
        Err(SchemaError::InvalidContent(kind.to_string()).into())
    }
}

/// Moves the selected list items one level deeper, into the item before
/// them. The nested list takes the kind and attributes of its parent list.
pub fn sink_list_item(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    let Some(range) = item_range(tr.doc(), selection.from(), selection.to()) else {
        return Ok(false);
    };
    if range.start == 0 {
        return Ok(false);
    }
    let list = node_at(tr.doc(), &range.list_path)?.clone();
    let items: Vec<Node> = list.content[range.start..range.end].to_vec();
    let mut previous = list.content[range.start - 1].clone();

    match previous.content.last_mut() {
        Some(nested) if nested.kind == list.kind => nested.content.extend(items),
        _ => {
            let nested = tr.schema().node(&list.kind, Some(&list.attrs), items)?;
            previous.content.push(nested);
        }
    }

    let mut content = list.content.clone();
    content.splice(range.start - 1..range.end, [previous]);
    check_content(tr, &list.kind, &content)?;
    trace!(items = range.end - range.start, "list items sunk");
    tr.step(Op::ReplaceChildren {
        path: range.list_path,
        content,
    })?;
    Ok(true)
}

/// Moves the selected list items one level up. Items of a nested list
/// join the outer list; items of a top-level list leave the list.
pub fn lift_list_item(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    let Some(range) = item_range(tr.doc(), selection.from(), selection.to()) else {
        return Ok(false);
    };
    let nested = range.list_depth >= 2 && {
        let outer_item = node_at(tr.doc(), &range.list_path[..range.list_depth - 1])?;
        is_list_item(outer_item)
    };
    if nested {
        lift_to_outer_list(tr, &range)?;
    } else {
        lift_out_of_list(tr, &range)?;
    }
    Ok(true)
}

fn lift_to_outer_list(tr: &mut Transaction, range: &ItemRange) -> Result<(), ApplyError> {
    let list_path = &range.list_path;
    let item_path = &list_path[..list_path.len() - 1];
    let outer_path = &item_path[..item_path.len() - 1];
    let list_index = list_path[list_path.len() - 1];
    let item_index = item_path[item_path.len() - 1];

    let outer = node_at(tr.doc(), outer_path)?.clone();
    let mut outer_item = outer.content[item_index].clone();
    let inner = outer_item.content[list_index].clone();

    let mut lifted: Vec<Node> = inner.content[range.start..range.end].to_vec();
    let trailing: Vec<Node> = inner.content[range.end..].to_vec();
    let keep: Vec<Node> = inner.content[..range.start].to_vec();

    if keep.is_empty() {
        outer_item.content.remove(list_index);
    } else {
        outer_item.content[list_index] = inner.clone().with_content(keep);
    }
    if !trailing.is_empty() {
        if let Some(last) = lifted.last_mut() {
            match last.content.last_mut() {
                Some(list) if list.kind == inner.kind => list.content.extend(trailing),
                _ => last.content.push(inner.clone().with_content(trailing)),
            }
        }
    }

    let mut content = outer.content.clone();
    let mut replacement = vec![outer_item];
    replacement.extend(lifted);
    content.splice(item_index..=item_index, replacement);
    check_content(tr, &outer.kind, &content)?;
    tr.step(Op::ReplaceChildren {
        path: outer_path.to_vec(),
        content,
    })?;
    Ok(())
}

fn lift_out_of_list(tr: &mut Transaction, range: &ItemRange) -> Result<(), ApplyError> {
    let list_path = &range.list_path;
    let container_path = &list_path[..list_path.len() - 1];
    let list_index = list_path[list_path.len() - 1];

    let container = node_at(tr.doc(), container_path)?.clone();
    let list = container.content[list_index].clone();
    let before: Vec<Node> = list.content[..range.start].to_vec();
    let after: Vec<Node> = list.content[range.end..].to_vec();

    let mut replacement = Vec::new();
    if !before.is_empty() {
        replacement.push(list.clone().with_content(before));
    }
    for item in &list.content[range.start..range.end] {
        replacement.extend(item.content.iter().cloned());
    }
    if !after.is_empty() {
        replacement.push(list.clone().with_content(after));
    }

    let mut content = container.content.clone();
    content.splice(list_index..=list_index, replacement);
    check_content(tr, &container.kind, &content)?;
    tr.step(Op::ReplaceChildren {
        path: container_path.to_vec(),
        content,
    })?;
    Ok(())
}

/// Wraps runs of paragraphs and headings between `from` and `to` in lists
/// of `kind`, one item per block. With `join_before`, a new list directly
/// after a list of the same kind is merged into it.
pub fn wrap_in_list(
    tr: &mut Transaction,
    from: usize,
    to: usize,
    kind: &str,
    attrs: Option<&Attrs>,
    join_before: bool,
) -> Result<bool, ApplyError> {
    let (container_path, container, start, end) = {
        let doc = tr.doc();
        let start_pos = doc.resolve(from)?;
        let mut depth = start_pos.shared_depth(to);
        if tr.schema().is_textblock(&start_pos.node(depth).kind) && depth > 0 {
            depth -= 1;
        }
        let end_pos = doc.resolve(to)?;
        let start = start_pos.index(depth);
        let end = if end_pos.depth() > depth {
            end_pos.index(depth) + 1
        } else {
            end_pos.index_after(depth)
        };
        (
            start_pos.path_to(depth),
            start_pos.node(depth).clone(),
            start,
            end.max(start + 1).min(start_pos.node(depth).child_count()),
        )
    };
    if start >= end {
        return Ok(false);
    }

    let schema = tr.schema_arc();
    let mut content: Vec<Node> = container.content[..start].to_vec();
    let mut run: Vec<Node> = Vec::new();
    let mut wrapped = false;
    let flush = |run: &mut Vec<Node>, content: &mut Vec<Node>| -> Result<(), ApplyError> {
        if run.is_empty() {
            return Ok(());
        }
        let items = run
            .drain(..)
            .map(|block| schema.node(LIST_ITEM, None, vec![block]))
            .collect::<Result<Vec<_>, _>>()?;
        let list = schema.node(kind, attrs, items)?;
        match content.last_mut() {
            Some(previous) if join_before && previous.kind == kind => {
                previous.content.extend(list.content);
            }
            _ => content.push(list),
        }
        Ok(())
    };
    for child in &container.content[start..end] {
        if is_paragraph_or_heading(child) {
            run.push(child.clone());
            wrapped = true;
        } else {
            flush(&mut run, &mut content)?;
            content.push(child.clone());
        }
    }
    flush(&mut run, &mut content)?;
    if !wrapped {
        return Ok(false);
    }
    content.extend(container.content[end..].iter().cloned());

    check_content(tr, &container.kind, &content)?;
    tr.step(Op::ReplaceChildren {
        path: container_path,
        content,
    })?;
    Ok(true)
}

pub fn split_list_item(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if !selection.is_empty() {
        tr.delete(selection.from(), selection.to())?;
    }
    let pos = tr.selection().head;
    let (list_path, item_index, item, block_index, offset, marks) = {
        let doc = tr.doc();
        let resolved = doc.resolve(pos)?;
        let depth = resolved.depth();
        if depth < 3 || !tr.schema().is_textblock(&resolved.parent().kind) {
            return Ok(false);
        }
        if !is_list_item(resolved.node(depth - 1)) || !is_list(resolved.node(depth - 2)) {
            return Ok(false);
        }
        (
            resolved.path_to(depth - 2),
            resolved.index(depth - 2),
            resolved.node(depth - 1).clone(),
            resolved.index(depth - 1),
            resolved.parent_offset(),
            resolved.marks(tr.schema()),
        )
    };

    let block = &item.content[block_index];
    if block.content.is_empty() && block_index == 0 && item.child_count() == 1 {
        return lift_list_item(tr);
    }

    let at_end = offset == block.content_size();
    let (head, tail) = split_inline(&block.content, offset);
    let first_block = block.clone().with_content(head);
    let second_block = if at_end {
        tr.schema().node("paragraph", None, Vec::new())?
    } else {
        block.clone().with_content(tail)
    };

    let mut first_children: Vec<Node> = item.content[..block_index].to_vec();
    first_children.push(first_block);
    let mut second_children = vec![second_block];
    second_children.extend(item.content[block_index + 1..].iter().cloned());

    let first = item.clone().with_content(first_children);
    let second = tr.schema().node(LIST_ITEM, Some(&item.attrs), second_children)?;

    let list = node_at(tr.doc(), &list_path)?;
    let mut content = list.content.clone();
    content.splice(item_index..=item_index, [first, second]);
    check_content(tr, &list.kind.clone(), &content)?;

    tr.step_with_map(
        Op::ReplaceChildren {
            path: list_path,
            content,
        },
        Some(StepMap::Replace {
            start: pos,
            old: 0,
            new: 4,
        }),
    )?;
    tr.set_selection(Selection::cursor(pos + 4));
    if !marks.is_empty() {
        tr.set_stored_marks(Some(marks));
    }
    Ok(true)
}

pub fn delete_empty_list_item(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if !selection.is_empty() {
        return Ok(false);
    }
    let empty_item = {
        let resolved = tr.doc().resolve(selection.head)?;
        let depth = resolved.depth();
        depth >= 2
            && resolved.parent().content.is_empty()
            && is_list_item(resolved.node(depth - 1))
            && resolved.index(depth - 1) == 0
    };
    if !empty_item {
        return Ok(false);
    }
    lift_list_item(tr)
}

fn converted_attrs(list: &Node, style: Option<&str>) -> Attrs {
    let mut attrs = list.attrs.clone();
    attrs.remove("listStyleType");
    if let Some(style) = style {
        attrs.insert("listStyleType".to_string(), Value::from(style));
    }
    attrs
}

/// Toggles a list of `kind` over the selection.
///
/// Lists touched by the selection are unwrapped when they all already
/// match, retyped otherwise; loose blocks outside any list get wrapped.
pub fn toggle_list(tr: &mut Transaction, kind: &str, style: Option<&str>) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let (from, to) = (selection.from(), selection.to());

    let mut roots: BTreeMap<usize, &Node> = BTreeMap::new();
    let mut loose = 0usize;
    doc.nodes_between(from, to.max(from), |node, pos, parent, _| {
        if is_list(node) {
            if let Some((root_pos, root)) = find_root_list(&doc, pos + 1) {
                roots.insert(root_pos, root);
            }
            return true;
        }
        if is_paragraph_or_heading(node) {
            match find_root_list(&doc, pos + 1) {
                Some((root_pos, root)) => {
                    roots.insert(root_pos, root);
                }
                None if !is_list_item(parent) => loose += 1,
                None => {}
            }
            return false;
        }
        true
    });

    let default_style = tr
        .schema()
        .default_attrs(kind)
        .get("listStyleType")
        .and_then(Value::as_str)
        .map(str::to_string);
    let style = style.map(str::to_string).or(default_style);

    let matches = |list: &Node| {
        list.kind == kind && list.attr_str("listStyleType") == style.as_deref()
    };
    if !roots.is_empty() && loose == 0 && roots.values().all(|root| matches(root)) {
        trace!(kind, "list unwrapped");
        return lift_list_item(tr);
    }

    if !roots.is_empty() {
        for (&root_pos, &root) in &roots {
            let end = root_pos + root.node_size();
            let mut lists = Vec::new();
            traverse_in_range_recursively(&doc, root_pos, end, false, |ctx| {
                if ctx.pos >= root_pos && ctx.pos < end && is_list(ctx.node) {
                    lists.push((ctx.pos, ctx.node));
                }
            });
            for (pos, list) in lists {
                let attrs = converted_attrs(list, style.as_deref());
                tr.set_node_markup(pos, kind, Some(&attrs))?;
            }
        }
        trace!(kind, roots = roots.len(), "lists converted");
        return Ok(true);
    }

    if loose > 0 {
        let mut attrs = Attrs::new();
        if let Some(style) = &style {
            attrs.insert("listStyleType".to_string(), Value::from(style.as_str()));
        }
        return wrap_in_list(tr, from, to, kind, Some(&attrs), false);
    }
    Ok(false)
}
