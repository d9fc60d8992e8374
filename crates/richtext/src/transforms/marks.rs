use tracing::trace;

use crate::core::{Attrs, find_mark};
use crate::error::ApplyError;
use crate::helpers::range_has_mark;
use crate::ops::Transaction;

fn trimmed_ranges(tr: &Transaction, from: usize, to: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for (path, pos) in tr.textblocks_between(from, to) {
        let Some(block) = tr.doc().node_at_path(&path) else {
            continue;
        };
        let start = (pos + 1).max(from);
        let end = (pos + 1 + block.content_size()).min(to);
        if start >= end {
            continue;
        }
        let text = tr.doc().text_between(start, end, "", "\u{fffc}");
        let lead = text.chars().take_while(|c| c.is_whitespace()).count();
        let trail = text.chars().rev().take_while(|c| c.is_whitespace()).count();
        if lead + trail >= end - start {
            continue;
        }
        ranges.push((start + lead, end - trail));
    }
    ranges
}

pub fn set_mark(tr: &mut Transaction, kind: &str, attrs: Option<&Attrs>) -> Result<bool, ApplyError> {
    let mark = tr.schema().mark(kind, attrs)?;
    let selection = tr.selection();
    if selection.is_empty() {
        tr.add_stored_mark(mark);
        return Ok(true);
    }
    for (from, to) in trimmed_ranges(tr, selection.from(), selection.to()) {
        tr.add_mark(from, to, mark.clone())?;
    }
    Ok(true)
}

pub fn unset_mark(tr: &mut Transaction, kind: &str) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    if selection.is_empty() {
        tr.remove_stored_mark(kind);
        return Ok(true);
    }
    tr.remove_mark(selection.from(), selection.to(), Some(kind))?;
    Ok(true)
}

/// Removes `kind` when the selection already carries it anywhere, adds it
/// otherwise. A cursor toggles the stored marks.
pub fn toggle_mark(tr: &mut Transaction, kind: &str, attrs: Option<&Attrs>) -> Result<bool, ApplyError> {
    let selection = tr.selection();
    let active = if selection.is_empty() {
        find_mark(&tr.current_marks(), kind).is_some()
    } else {
        range_has_mark(tr.doc(), selection.from(), selection.to(), kind)
    };
    trace!(mark = kind, active, "toggle mark");
    if active {
        unset_mark(tr, kind)
    } else {
        set_mark(tr, kind, attrs)
    }
}
