use tracing::trace;

use crate::core::{Node, Selection};
use crate::error::ApplyError;
use crate::extensions::outcome;
use crate::helpers::{first_text_pos, last_text_pos};
use crate::ops::Transaction;
use crate::plugin::{CommandProps, Extension, KeyBinding};
use crate::schema::Schema;

/// Fallback editing keys. Runs after every other extension's bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseKeymap;

/// Text block boundaries as `(start, end)` content positions, in order.
fn textblock_spans(doc: &Node, schema: &Schema) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    doc.descendants(|node, pos, _, _| {
        if schema.is_textblock(&node.kind) {
            spans.push((pos + 1, pos + 1 + node.content_size()));
            return false;
        }
        true
    });
    spans
}

fn crosses_isolating(doc: &Node, schema: &Schema, a: usize, b: usize) -> Result<bool, ApplyError> {
    let start = doc.resolve(a)?;
    let end = doc.resolve(b)?;
    let shared = start.shared_depth(b);
    let isolating = |depth: usize, node: &Node| {
        depth > shared && schema.node_spec(&node.kind).is_some_and(|spec| spec.isolating)
    };
    let crosses = (1..=start.depth()).any(|depth| isolating(depth, start.node(depth)))
        || (1..=end.depth()).any(|depth| isolating(depth, end.node(depth)));
    Ok(crosses)
}

fn split_keeping_marks(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if !selection.is_empty() {
        tr.delete(selection.from(), selection.to())?;
    }
    let pos = tr.selection().head;
    let marks = {
        let resolved = tr.doc().resolve(pos)?;
        if resolved.depth() == 0 || !tr.schema().is_textblock(&resolved.parent().kind) {
            return Ok(false);
        }
        match tr.stored_marks() {
            Some(marks) => marks.to_vec(),
            None => resolved.marks(tr.schema()),
        }
    };
    tr.split_block(pos)?;
    if !marks.is_empty() {
        tr.set_stored_marks(Some(marks));
    }
    trace!(pos, "block split");
    Ok(true)
}

fn delete_backward(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if !selection.is_empty() {
        tr.delete(selection.from(), selection.to())?;
        return Ok(true);
    }
    let pos = selection.head;
    let at_start = tr.doc().resolve(pos)?.parent_offset() == 0;
    if !at_start {
        tr.delete(pos - 1, pos)?;
        return Ok(true);
    }
    let spans = textblock_spans(tr.doc(), tr.schema());
    let Some(&(_, previous_end)) = spans.iter().rev().find(|(_, end)| *end < pos) else {
        return Ok(false);
    };
    if crosses_isolating(tr.doc(), tr.schema(), previous_end, pos)? {
        return Ok(false);
    }
    tr.delete(previous_end, pos)?;
    tr.set_selection(Selection::cursor(previous_end));
    Ok(true)
}

fn delete_forward(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if !selection.is_empty() {
        tr.delete(selection.from(), selection.to())?;
        return Ok(true);
    }
    let pos = selection.head;
    let at_end = {
        let resolved = tr.doc().resolve(pos)?;
        resolved.parent_offset() == resolved.parent().content_size()
    };
    if !at_end {
        tr.delete(pos, pos + 1)?;
        return Ok(true);
    }
    let spans = textblock_spans(tr.doc(), tr.schema());
    let Some(&(next_start, _)) = spans.iter().find(|(start, _)| *start > pos) else {
        return Ok(false);
    };
    if crosses_isolating(tr.doc(), tr.schema(), pos, next_start)? {
        return Ok(false);
    }
    tr.delete(pos, next_start)?;
    tr.set_selection(Selection::cursor(pos));
    Ok(true)
}

fn select_all(props: &mut CommandProps<'_>) -> bool {
    let doc = props.tr.doc();
    let from = first_text_pos(doc, props.schema()).unwrap_or(0);
    let to = last_text_pos(doc, props.schema()).unwrap_or(from);
    props.tr.set_selection(Selection::new(from, to));
    true
}

impl Extension for BaseKeymap {
    fn name(&self) -> &str {
        "baseKeymap"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new("Enter", |props| outcome("Enter", split_keeping_marks(props.tr))),
            KeyBinding::new("Backspace", |props| outcome("Backspace", delete_backward(props.tr))),
            KeyBinding::new("Delete", |props| outcome("Delete", delete_forward(props.tr))),
            KeyBinding::new("Mod-a", select_all),
        ]
    }
}
