use mailkit_history::Command;

use crate::commands::check_row_insert;
use crate::entity::{RowEntity, RowUpdate};
use crate::error::TemplateError;
use crate::store::TemplateStore;

/// Inserts a copy of a row. The copy gets fresh ids for itself and
/// everything inside it.
#[derive(Debug)]
pub struct AddRowCommand {
    index: usize,
    row: Option<RowEntity>,
}

impl AddRowCommand {
    pub fn new(row: &RowEntity, index: usize) -> Self {
        Self {
            index,
            row: Some(row.clone().with_fresh_ids()),
        }
    }

    /// Id the inserted row gets.
    pub fn row_id(&self) -> Option<&str> {
        self.row.as_ref().map(|row| row.id.as_str())
    }
}

impl Command<TemplateStore, TemplateError> for AddRowCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        check_row_insert(store, self.index)?;
        let Some(row) = self.row.take() else {
            return Ok(());
        };
        store.rows_mut().insert(self.index, row);
        store.map_nodes();
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.row.is_some() {
            return Ok(());
        }
        store.row(self.index)?;
        self.row = Some(store.rows_mut().remove(self.index));
        store.map_nodes();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "row.add"
    }
}

#[derive(Debug)]
pub struct DeleteRowCommand {
    index: usize,
    removed: Option<RowEntity>,
}

impl DeleteRowCommand {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            removed: None,
        }
    }
}

impl Command<TemplateStore, TemplateError> for DeleteRowCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        store.row(self.index)?;
        self.removed = Some(store.rows_mut().remove(self.index));
        store.map_nodes();
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.removed.is_none() {
            return Ok(());
        }
        check_row_insert(store, self.index)?;
        let Some(row) = self.removed.take() else {
            return Ok(());
        };
        store.rows_mut().insert(self.index, row);
        store.map_nodes();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "row.delete"
    }
}

#[derive(Debug)]
pub struct MoveRowCommand {
    from: usize,
    to: usize,
    moved: bool,
}

impl MoveRowCommand {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            moved: false,
        }
    }
}

fn move_row(store: &mut TemplateStore, from: usize, to: usize) -> Result<(), TemplateError> {
    store.row(from)?;
    // `to` addresses the sequence after removal, which has the same bound
    // as the current one.
    let len = store.rows().len();
    if to >= len {
        return Err(TemplateError::RowOutOfRange { index: to, len });
    }
    let row = store.rows_mut().remove(from);
    store.rows_mut().insert(to, row);
    store.map_nodes();
    Ok(())
}

impl Command<TemplateStore, TemplateError> for MoveRowCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        move_row(store, self.from, self.to)?;
        self.moved = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if !self.moved {
            return Ok(());
        }
        move_row(store, self.to, self.from)?;
        self.moved = false;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "row.move"
    }
}

/// Inserts a copy of the row at `source` at `target`. The copy is made on
/// first execution and reused on redo, so its ids stay stable.
#[derive(Debug)]
pub struct CloneRowCommand {
    source: usize,
    target: usize,
    clone: Option<RowEntity>,
    inserted: bool,
}

impl CloneRowCommand {
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            clone: None,
            inserted: false,
        }
    }
}

impl Command<TemplateStore, TemplateError> for CloneRowCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.inserted {
            return Ok(());
        }
        let row = match self.clone.take() {
            Some(row) => row,
            None => store.row(self.source)?.clone().with_fresh_ids(),
        };
        if let Err(err) = check_row_insert(store, self.target) {
            self.clone = Some(row);
            return Err(err);
        }
        store.rows_mut().insert(self.target, row);
        store.map_nodes();
        self.inserted = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if !self.inserted {
            return Ok(());
        }
        store.row(self.target)?;
        self.clone = Some(store.rows_mut().remove(self.target));
        store.map_nodes();
        self.inserted = false;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "row.clone"
    }
}

/// Merges a partial update into a row. Undo puts back the row as it was.
#[derive(Debug)]
pub struct UpdateRowCommand {
    index: usize,
    update: RowUpdate,
    previous: Option<RowEntity>,
}

impl UpdateRowCommand {
    pub fn new(index: usize, update: RowUpdate) -> Self {
        Self {
            index,
            update,
            previous: None,
        }
    }
}

impl Command<TemplateStore, TemplateError> for UpdateRowCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        let row = store.row_mut(self.index)?;
        self.previous = Some(row.clone());
        self.update.apply_to(row);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.previous.is_none() {
            return Ok(());
        }
        let row = store.row_mut(self.index)?;
        if let Some(previous) = self.previous.take() {
            *row = previous;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "row.update"
    }
}
