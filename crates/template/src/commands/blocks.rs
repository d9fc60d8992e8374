use mailkit_history::Command;

use crate::entity::{BlockEntity, BlockUpdate};
use crate::error::TemplateError;
use crate::store::{BlockCoordinates, TemplateStore};

fn check_block_insert(store: &TemplateStore, at: BlockCoordinates) -> Result<(), TemplateError> {
    let len = store.column(at.column())?.blocks.len();
    if at.block_index > len {
        return Err(TemplateError::BlockOutOfRange {
            row: at.row_index,
            column: at.column_index,
            index: at.block_index,
            len,
        });
    }
    Ok(())
}

fn insert_block(store: &mut TemplateStore, at: BlockCoordinates, block: BlockEntity) -> Result<(), TemplateError> {
    store.column_mut(at.column())?.blocks.insert(at.block_index, block);
    store.map_nodes();
    Ok(())
}

fn remove_block(store: &mut TemplateStore, at: BlockCoordinates) -> Result<BlockEntity, TemplateError> {
    store.block(at)?;
    let block = store.column_mut(at.column())?.blocks.remove(at.block_index);
    store.map_nodes();
    Ok(block)
}

#[derive(Debug)]
pub struct AddBlockCommand {
    at: BlockCoordinates,
    block: Option<BlockEntity>,
}

impl AddBlockCommand {
    /// The block is copied with a fresh id.
    pub fn new(block: &BlockEntity, at: BlockCoordinates) -> Self {
        Self {
            at,
            block: Some(block.clone().with_fresh_ids()),
        }
    }

    pub fn block_id(&self) -> Option<&str> {
        self.block.as_ref().map(BlockEntity::id)
    }
}

impl Command<TemplateStore, TemplateError> for AddBlockCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        check_block_insert(store, self.at)?;
        let Some(block) = self.block.take() else {
            return Ok(());
        };
        insert_block(store, self.at, block)
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.block.is_some() {
            return Ok(());
        }
        self.block = Some(remove_block(store, self.at)?);
        Ok(())
    }

    fn label(&self) -> &'static str {
        "block.add"
    }
}

#[derive(Debug)]
pub struct DeleteBlockCommand {
    at: BlockCoordinates,
    removed: Option<BlockEntity>,
}

impl DeleteBlockCommand {
    pub fn new(at: BlockCoordinates) -> Self {
        Self { at, removed: None }
    }
}

impl Command<TemplateStore, TemplateError> for DeleteBlockCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        self.removed = Some(remove_block(store, self.at)?);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.removed.is_none() {
            return Ok(());
        }
        check_block_insert(store, self.at)?;
        match self.removed.take() {
            Some(block) => insert_block(store, self.at, block),
            None => Ok(()),
        }
    }

    fn label(&self) -> &'static str {
        "block.delete"
    }
}

/// Moves a block, possibly into another column. `to` addresses the
/// target column after the block has been taken out.
#[derive(Debug)]
pub struct MoveBlockCommand {
    from: BlockCoordinates,
    to: BlockCoordinates,
    moved: bool,
}

impl MoveBlockCommand {
    pub fn new(from: BlockCoordinates, to: BlockCoordinates) -> Self {
        Self {
            from,
            to,
            moved: false,
        }
    }
}

fn move_block(store: &mut TemplateStore, from: BlockCoordinates, to: BlockCoordinates) -> Result<(), TemplateError> {
    store.block(from)?;
    let len = store.column(to.column())?.blocks.len();
    // Within one column the block is removed first, so the end slot is gone.
    let max = if from.column() == to.column() { len - 1 } else { len };
    if to.block_index > max {
        return Err(TemplateError::BlockOutOfRange {
            row: to.row_index,
            column: to.column_index,
            index: to.block_index,
            len,
        });
    }
    let block = remove_block(store, from)?;
    insert_block(store, to, block)
}

impl Command<TemplateStore, TemplateError> for MoveBlockCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        move_block(store, self.from, self.to)?;
        self.moved = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if !self.moved {
            return Ok(());
        }
        move_block(store, self.to, self.from)?;
        self.moved = false;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "block.move"
    }
}

/// Inserts a copy of the block at `source` at `target`, with a fresh id.
/// The copy is kept across undo so redo reinserts the same block.
#[derive(Debug)]
pub struct CloneBlockCommand {
    source: BlockCoordinates,
    target: BlockCoordinates,
    clone: Option<BlockEntity>,
    inserted: bool,
}

impl CloneBlockCommand {
    pub fn new(source: BlockCoordinates, target: BlockCoordinates) -> Self {
        Self {
            source,
            target,
            clone: None,
            inserted: false,
        }
    }
}

impl Command<TemplateStore, TemplateError> for CloneBlockCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.inserted {
            return Ok(());
        }
        if self.clone.is_none() {
            self.clone = Some(store.block(self.source)?.clone().with_fresh_ids());
        }
        check_block_insert(store, self.target)?;
        if let Some(block) = self.clone.take() {
            insert_block(store, self.target, block)?;
            self.inserted = true;
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if !self.inserted {
            return Ok(());
        }
        self.clone = Some(remove_block(store, self.target)?);
        self.inserted = false;
        Ok(())
    }

    fn label(&self) -> &'static str {
        "block.clone"
    }
}

#[derive(Debug)]
pub struct UpdateBlockCommand {
    at: BlockCoordinates,
    update: BlockUpdate,
    previous: Option<BlockEntity>,
}

impl UpdateBlockCommand {
    pub fn new(at: BlockCoordinates, update: BlockUpdate) -> Self {
        Self {
            at,
            update,
            previous: None,
        }
    }

    pub fn coordinates(&self) -> BlockCoordinates {
        self.at
    }

    pub fn update(&self) -> &BlockUpdate {
        &self.update
    }
}

impl Command<TemplateStore, TemplateError> for UpdateBlockCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        let block = store.block_mut(self.at)?;
        self.previous = Some(block.clone());
        self.update.apply_to(block);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if self.previous.is_none() {
            return Ok(());
        }
        let block = store.block_mut(self.at)?;
        if let Some(previous) = self.previous.take() {
            *block = previous;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "block.update"
    }
}
