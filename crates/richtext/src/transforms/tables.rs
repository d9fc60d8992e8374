use serde_json::Value;
use tracing::{trace, warn};

use crate::core::{Attrs, Node, Selection};
use crate::error::ApplyError;
use crate::helpers::near_text_pos;
use crate::ops::{AttrPatch, Op, Path, Transaction};
use crate::transforms::table_widths::{distribute_width_evenly, get_column_widths, normalize_widths};

pub fn is_table_cell(node: &Node) -> bool {
    node.kind == "tableCell" || node.kind == "tableHeader"
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellContext {
    pub table_pos: usize,
    pub table_path: Path,
    pub table: Node,
    pub row: usize,
    pub col: usize,
}

impl CellContext {
    fn cell_path(&self, row: usize, col: usize) -> Path {
        let mut path = self.table_path.clone();
        path.extend([row, col]);
        path
    }

    fn row_path(&self, row: usize) -> Path {
        let mut path = self.table_path.clone();
        path.push(row);
        path
    }
}

pub fn cell_context(doc: &Node, pos: usize) -> Option<CellContext> {
    let resolved = doc.resolve(pos).ok()?;
    let depth = (3..=resolved.depth()).rev().find(|&depth| {
        is_table_cell(resolved.node(depth))
            && resolved.node(depth - 1).kind == "tableRow"
            && resolved.node(depth - 2).kind == "table"
    })?;
    let table_depth = depth - 2;
    Some(CellContext {
        table_pos: resolved.before(table_depth)?,
        table_path: resolved.path_to(table_depth),
        table: resolved.node(table_depth).clone(),
        row: resolved.index(table_depth),
        col: resolved.index(depth - 1),
    })
}

fn width_value(width: f64) -> Value {
    Value::from(vec![width])
}

fn cell_attrs(width: Option<f64>) -> Attrs {
    let mut attrs = Attrs::new();
    if let Some(width) = width {
        attrs.insert("colwidth".to_string(), width_value(width));
    }
    attrs
}

fn settle_selection(tr: &mut Transaction) {
    let head = tr.selection().head;
    let pos = near_text_pos(tr.doc(), tr.schema(), head);
    tr.set_selection(Selection::cursor(pos));
}

pub fn insert_table(tr: &mut Transaction, rows: usize, cols: usize) -> Result<bool, ApplyError> {
    let (rows, cols) = (rows.max(1), cols.max(1));
    let width = 100.0 / cols as f64;
    let schema = tr.schema_arc();
    let mut row_nodes = Vec::with_capacity(rows);
    for _ in 0..rows {
        let cells = (0..cols)
            .map(|_| schema.create_and_fill("tableCell", Some(&cell_attrs(Some(width)))))
            .collect::<Result<Vec<_>, _>>()?;
        row_nodes.push(schema.node("tableRow", None, cells)?);
    }
    let mut attrs = Attrs::new();
    attrs.insert("tableWidth".to_string(), Value::from("100%"));
    let table = schema.node("table", Some(&attrs), row_nodes)?;

    let selection = tr.selection();
    if !selection.is_empty() {
        tr.delete(selection.from(), selection.to())?;
    }
    let table_pos = tr.insert_block_near(tr.selection().from(), table)?;
    let first_cell = near_text_pos(tr.doc(), tr.schema(), table_pos + 4);
    tr.set_selection(Selection::cursor(first_cell));
    trace!(rows, cols, table_pos, "table inserted");
    Ok(true)
}

pub fn add_row(tr: &mut Transaction, after: bool) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    let Some(reference) = ctx.table.child(ctx.row) else {
        return Ok(false);
    };
    let schema = tr.schema_arc();
    let cells = reference
        .content
        .iter()
        .map(|cell| {
            let mut attrs = Attrs::new();
            if let Some(width) = cell.attr("colwidth").filter(|w| !w.is_null()) {
                attrs.insert("colwidth".to_string(), width.clone());
            }
            schema.create_and_fill("tableCell", Some(&attrs))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let row = schema.node("tableRow", None, cells)?;
    let index = if after { ctx.row + 1 } else { ctx.row };
    tr.step(Op::InsertNode {
        path: ctx.row_path(index),
        node: row,
    })?;
    Ok(true)
}

/// Removes the cursor's row. The last row is never removed.
pub fn delete_row(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    if ctx.table.child_count() <= 1 {
        return Ok(false);
    }
    tr.step(Op::RemoveNode {
        path: ctx.row_path(ctx.row),
    })?;
    settle_selection(tr);
    Ok(true)
}

fn set_all_widths(tr: &mut Transaction, ctx: &CellContext, widths: &[f64]) -> Result<(), ApplyError> {
    let table = tr
        .doc()
        .node_at_path(&ctx.table_path)
        .cloned()
        .ok_or_else(|| ApplyError::path(&ctx.table_path, "no such node"))?;
    for (row_index, row) in table.content.iter().enumerate() {
        for col in 0..row.child_count() {
            let Some(width) = widths.get(col) else {
                continue;
            };
            tr.step(Op::SetNodeAttrs {
                path: ctx.cell_path(row_index, col),
                patch: AttrPatch::set("colwidth", width_value(*width)),
            })?;
        }
    }
    Ok(())
}

/// Adds a column before or after the cursor's column and spreads the
/// widths evenly. Refused when the columns would drop below `min_width`.
pub fn add_column(tr: &mut Transaction, after: bool, min_width: f64) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    let current = get_column_widths(&ctx.table);
    let Some(widths) = distribute_width_evenly(&current, min_width) else {
        warn!(
            "Cannot add column: max {} columns at {min_width}% minimum",
            (100.0 / min_width).floor()
        );
        return Ok(false);
    };
    let index = if after { ctx.col + 1 } else { ctx.col };
    let schema = tr.schema_arc();
    for (row_index, row) in ctx.table.content.iter().enumerate() {
        let header_row = !row.content.is_empty() && row.content.iter().all(|cell| cell.kind == "tableHeader");
        let kind = if header_row { "tableHeader" } else { "tableCell" };
        let cell = schema.create_and_fill(kind, None)?;
        tr.step(Op::InsertNode {
            path: ctx.cell_path(row_index, index.min(row.child_count())),
            node: cell,
        })?;
    }
    set_all_widths(tr, &ctx, &widths)?;
    Ok(true)
}

/// Removes the cursor's column and rescales the remaining widths. The
/// last column is never removed.
pub fn delete_column(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    let mut widths = get_column_widths(&ctx.table);
    if widths.len() <= 1 {
        return Ok(false);
    }
    for (row_index, row) in ctx.table.content.iter().enumerate() {
        if ctx.col < row.child_count() {
            tr.step(Op::RemoveNode {
                path: ctx.cell_path(row_index, ctx.col),
            })?;
        }
    }
    if ctx.col < widths.len() {
        widths.remove(ctx.col);
    }
    set_all_widths(tr, &ctx, &normalize_widths(&widths))?;
    settle_selection(tr);
    Ok(true)
}

/// Removes the table around the cursor. A table that is the only child
/// of its parent leaves an empty default block behind.
pub fn delete_table(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    let parent_path = &ctx.table_path[..ctx.table_path.len() - 1];
    let parent = tr
        .doc()
        .node_at_path(parent_path)
        .ok_or_else(|| ApplyError::path(parent_path, "no such node"))?;
    let replacement = if parent.child_count() == 1 {
        let kind = tr
            .schema()
            .default_block_kind(&parent.kind)
            .unwrap_or("paragraph")
            .to_string();
        Some(tr.schema().create_and_fill(&kind, None)?)
    } else {
        None
    };
    tr.step(Op::RemoveNode {
        path: ctx.table_path.clone(),
    })?;
    if let Some(node) = replacement {
        tr.step(Op::InsertNode {
            path: ctx.table_path.clone(),
            node,
        })?;
    }
    let pos = near_text_pos(tr.doc(), tr.schema(), ctx.table_pos);
    tr.set_selection(Selection::cursor(pos));
    Ok(true)
}

fn selected_cells(doc: &Node, from: usize, to: usize) -> Vec<(usize, &Node)> {
    let mut cells = Vec::new();
    if from == to {
        if let Some(ctx) = cell_context(doc, from) {
            let path = ctx.cell_path(ctx.row, ctx.col);
            if let (Some(pos), Some(cell)) = (doc.pos_of_path(&path), doc.node_at_path(&path)) {
                cells.push((pos, cell));
            }
        }
        return cells;
    }
    doc.nodes_between(from, to, |node, pos, _, _| {
        if is_table_cell(node) {
            cells.push((pos, node));
            return false;
        }
        true
    });
    cells
}

pub fn set_cell_attribute(tr: &mut Transaction, name: &str, value: Value) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let cells = selected_cells(&doc, selection.from(), selection.to());
    let mut changed = false;
    for (pos, cell) in cells {
        if cell.attr(name) == Some(&value) {
            continue;
        }
        tr.set_node_attribute(pos, name, value.clone())?;
        changed = true;
    }
    Ok(changed)
}

pub fn toggle_header_cell(tr: &mut Transaction) -> Result<bool, ApplyError> {
    let doc = tr.doc().clone();
    let selection = tr.selection();
    let cells = selected_cells(&doc, selection.from(), selection.to());
    if cells.is_empty() {
        return Ok(false);
    }
    let all_headers = cells.iter().all(|(_, cell)| cell.kind == "tableHeader");
    let kind = if all_headers { "tableCell" } else { "tableHeader" };
    for (pos, cell) in cells {
        if cell.kind == kind {
            continue;
        }
        let path = tr.path_at(pos)?;
        tr.step(Op::SetNodeKind {
            path,
            kind: kind.to_string(),
        })?;
    }
    Ok(true)
}

fn cell_content_range(doc: &Node, pos: usize) -> Option<(usize, usize)> {
    let cell = doc.node_at(pos)?;
    let mut first = None;
    let mut last = None;
    cell.descendants(|node, offset, _, _| {
        if node.looks_like_textblock() && !node.is_text() {
            let start = pos + 1 + offset + 1;
            if first.is_none() {
                first = Some(start);
            }
            last = Some(start + node.content_size());
            return false;
        }
        true
    });
    Some((first?, last?))
}

pub fn go_to_next_cell(tr: &mut Transaction, direction: i32) -> Result<bool, ApplyError> {
    let Some(ctx) = cell_context(tr.doc(), tr.selection().head) else {
        return Ok(false);
    };
    let cells: Vec<(usize, usize)> = ctx
        .table
        .content
        .iter()
        .enumerate()
        .flat_map(|(row, node)| (0..node.child_count()).map(move |col| (row, col)))
        .collect();
    let Some(current) = cells.iter().position(|&cell| cell == (ctx.row, ctx.col)) else {
        return Ok(false);
    };
    let target = if direction < 0 {
        current.checked_sub(1)
    } else {
        Some(current + 1).filter(|&next| next < cells.len())
    };
    let Some((row, col)) = target.map(|ix| cells[ix]) else {
        return Ok(false);
    };
    let Some(pos) = tr.doc().pos_of_path(&ctx.cell_path(row, col)) else {
        return Ok(false);
    };
    let Some((from, to)) = cell_content_range(tr.doc(), pos) else {
        return Ok(false);
    };
    tr.set_selection(Selection::new(from, to));
    Ok(true)
}
