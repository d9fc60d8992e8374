use std::collections::HashSet;

use mailkit_history::Command;
use tracing::{debug, warn};

use crate::commands::TemplateBatch;
use crate::entity::{ColumnEntity, ColumnUpdate};
use crate::error::TemplateError;
use crate::store::{ColumnCoordinates, TemplateStore};
use crate::widths::{
    COLUMN_MIN_WIDTH, clamp_width, collect_width_from_columns, distribute_width_to_columns,
    find_widest_editable_column, max_column_width,
};

fn check_column_insert(store: &TemplateStore, row: usize, index: usize) -> Result<(), TemplateError> {
    let len = store.row(row)?.columns.len();
    if index > len {
        return Err(TemplateError::ColumnOutOfRange { row, index, len });
    }
    Ok(())
}

/// Inserts a copy of a column with fresh ids. Sibling widths are left
/// alone; see [`add_column_with_redistribution`].
#[derive(Debug)]
pub struct AddColumnCommand {
    at: ColumnCoordinates,
    column: Option<ColumnEntity>,
}

impl AddColumnCommand {
    pub fn new(column: &ColumnEntity, at: ColumnCoordinates) -> Self {
        Self {
            at,
            column: Some(column.clone().with_fresh_ids()),
        }
    }
}

impl Command<TemplateStore, TemplateError> for AddColumnCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        check_column_insert(store, self.at.row_index, self.at.column_index)?;
        let Some(column) = self.column.take() else {
            return Ok(());
        };
        store
            .row_mut(self.at.row_index)?
            .columns
            .insert(self.at.column_index, column);
        store.map_nodes();
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.column.is_some() {
            return Ok(());
        }
        store.column(self.at)?;
        let removed = store.row_mut(self.at.row_index)?.columns.remove(self.at.column_index);
        self.column = Some(removed);
        store.map_nodes();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "column.add"
    }
}

#[derive(Debug)]
pub struct DeleteColumnCommand {
    at: ColumnCoordinates,
    removed: Option<ColumnEntity>,
}

impl DeleteColumnCommand {
    pub fn new(at: ColumnCoordinates) -> Self {
        Self { at, removed: None }
    }
}

impl Command<TemplateStore, TemplateError> for DeleteColumnCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        store.column(self.at)?;
        let removed = store.row_mut(self.at.row_index)?.columns.remove(self.at.column_index);
        self.removed = Some(removed);
        store.map_nodes();
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.removed.is_none() {
            return Ok(());
        }
        check_column_insert(store, self.at.row_index, self.at.column_index)?;
        if let Some(column) = self.removed.take() {
            store
                .row_mut(self.at.row_index)?
                .columns
                .insert(self.at.column_index, column);
        }
        store.map_nodes();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "column.delete"
    }
}

/// Moves a column within its row.
#[derive(Debug)]
pub struct MoveColumnCommand {
    row: usize,
    from: usize,
    to: usize,
    moved: bool,
}

impl MoveColumnCommand {
    pub fn new(row: usize, from: usize, to: usize) -> Self {
        Self {
            row,
            from,
            to,
            moved: false,
        }
    }
}

fn move_column(store: &mut TemplateStore, row: usize, from: usize, to: usize) -> Result<(), TemplateError> {
    store.column(ColumnCoordinates::new(row, from))?;
    let columns = &mut store.row_mut(row)?.columns;
    let len = columns.len();
    if to >= len {
        return Err(TemplateError::ColumnOutOfRange { row, index: to, len });
    }
    let column = columns.remove(from);
    columns.insert(to, column);
    store.map_nodes();
    Ok(())
}

impl Command<TemplateStore, TemplateError> for MoveColumnCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        move_column(store, self.row, self.from, self.to)?;
        self.moved = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if !self.moved {
            return Ok(());
        }
        move_column(store, self.row, self.to, self.from)?;
        self.moved = false;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "column.move"
    }
}

#[derive(Debug)]
pub struct UpdateColumnCommand {
    at: ColumnCoordinates,
    update: ColumnUpdate,
    previous: Option<ColumnEntity>,
}

impl UpdateColumnCommand {
    pub fn new(at: ColumnCoordinates, update: ColumnUpdate) -> Self {
        Self {
            at,
            update,
            previous: None,
        }
    }
}

impl Command<TemplateStore, TemplateError> for UpdateColumnCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        let column = store.column_mut(self.at)?;
        self.previous = Some(column.clone());
        self.update.apply_to(column);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.previous.is_none() {
            return Ok(());
        }
        let column = store.column_mut(self.at)?;
        if let Some(previous) = self.previous.take() {
            *column = previous;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "column.update"
    }
}

/// Adds `column` with `width` points taken from its editable siblings, as
/// one undoable batch. Returns `None`, with a warning, when the siblings
/// cannot give that much.
pub fn add_column_with_redistribution(
    store: &TemplateStore,
    at: ColumnCoordinates,
    column: &ColumnEntity,
    width: u32,
    frozen: &HashSet<String>,
) -> Result<Option<TemplateBatch>, TemplateError> {
    let row = store.row(at.row_index)?;
    if at.column_index > row.columns.len() {
        return Err(TemplateError::ColumnOutOfRange {
            row: at.row_index,
            index: at.column_index,
            len: row.columns.len(),
        });
    }
    let Some(updates) = collect_width_from_columns(&row.columns, width, frozen) else {
        warn!(row = at.row_index, width, "not enough free width for a new column");
        return Ok(None);
    };

    let mut batch = TemplateBatch::new();
    for update in &updates {
        let target = ColumnCoordinates::new(at.row_index, update.index);
        batch.add(UpdateColumnCommand::new(target, ColumnUpdate::width(update.new_width)));
    }
    let mut column = column.clone();
    column.width = width;
    batch.add(AddColumnCommand::new(&column, at));
    debug!(row = at.row_index, donors = updates.len(), "column add planned");
    Ok(Some(batch))
}

/// Deletes a column and hands its width to the editable siblings with the
/// floor and remainder rule. Returns `None`, with a warning, when siblings
/// exist but all of them are frozen.
pub fn delete_column_with_redistribution(
    store: &TemplateStore,
    at: ColumnCoordinates,
    frozen: &HashSet<String>,
) -> Result<Option<TemplateBatch>, TemplateError> {
    let freed = store.column(at)?.width;
    let columns = &store.row(at.row_index)?.columns;
    let updates = distribute_width_to_columns(columns, freed, at.column_index, frozen);
    if updates.is_empty() && columns.len() > 1 {
        warn!(row = at.row_index, column = at.column_index, "no editable column to take the freed width");
        return Ok(None);
    }

    let mut batch = TemplateBatch::new();
    batch.add(DeleteColumnCommand::new(at));
    for update in updates {
        let target = ColumnCoordinates::new(at.row_index, update.index);
        batch.add(UpdateColumnCommand::new(target, ColumnUpdate::width(update.new_width)));
    }
    Ok(Some(batch))
}

/// Sets a column's width, letting the widest editable sibling absorb the
/// difference. The requested width is clamped so that neither column
/// leaves the allowed range. `None` when nothing would change.
pub fn resize_column(
    store: &TemplateStore,
    at: ColumnCoordinates,
    new_width: f64,
    frozen: &HashSet<String>,
) -> Result<Option<TemplateBatch>, TemplateError> {
    let current = store.column(at)?.width;
    let columns = &store.row(at.row_index)?.columns;
    let Some((sibling_index, sibling)) = find_widest_editable_column(columns, at.column_index, frozen)
    else {
        warn!(row = at.row_index, column = at.column_index, "no editable sibling to resize against");
        return Ok(None);
    };

    let requested = clamp_width(new_width, max_column_width(columns.len()));
    // The sibling can shrink down to the minimum and grow without bound.
    let ceiling = current + sibling.width.saturating_sub(COLUMN_MIN_WIDTH);
    let width = requested.min(ceiling);
    if width == current {
        return Ok(None);
    }
    let sibling_width = sibling.width + current - width;

    let mut batch = TemplateBatch::new();
    batch.add(UpdateColumnCommand::new(at, ColumnUpdate::width(width)));
    batch.add(UpdateColumnCommand::new(
        ColumnCoordinates::new(at.row_index, sibling_index),
        ColumnUpdate::width(sibling_width),
    ));
    Ok(Some(batch))
}
