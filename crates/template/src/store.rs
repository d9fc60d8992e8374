use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::{BlockEntity, BlockType, ColumnEntity, RootEntity, RowEntity, TemplateEntity};
use crate::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCoordinates {
    pub row_index: usize,
    pub column_index: usize,
}

impl ColumnCoordinates {
    pub fn new(row_index: usize, column_index: usize) -> Self {
        Self {
            row_index,
            column_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCoordinates {
    pub row_index: usize,
    pub column_index: usize,
    pub block_index: usize,
}

impl BlockCoordinates {
    pub fn new(row_index: usize, column_index: usize, block_index: usize) -> Self {
        Self {
            row_index,
            column_index,
            block_index,
        }
    }

    pub fn column(&self) -> ColumnCoordinates {
        ColumnCoordinates::new(self.row_index, self.column_index)
    }
}

/// A node found by id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Root(&'a RootEntity),
    Row(&'a RowEntity),
    Column(&'a ColumnEntity),
    Block(&'a BlockEntity),
}

impl NodeRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            NodeRef::Root(root) => &root.id,
            NodeRef::Row(row) => &row.id,
            NodeRef::Column(column) => &column.id,
            NodeRef::Block(block) => block.id(),
        }
    }
}

/// Owns the live template and an id index over it.
///
/// The index is a cache rebuilt in full by [`map_nodes`](Self::map_nodes)
/// after every structural change. Commands are the only mutation path.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    template: TemplateEntity,
    rows_index: HashMap<String, usize>,
    columns_index: HashMap<String, ColumnCoordinates>,
    blocks_index: HashMap<String, BlockCoordinates>,
}

impl TemplateStore {
    pub fn new(template: TemplateEntity) -> Self {
        let mut store = Self {
            template,
            rows_index: HashMap::new(),
            columns_index: HashMap::new(),
            blocks_index: HashMap::new(),
        };
        store.map_nodes();
        store
    }

    pub fn template(&self) -> &TemplateEntity {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut TemplateEntity {
        &mut self.template
    }

    pub fn set_template(&mut self, template: TemplateEntity) {
        self.template = template;
        self.map_nodes();
    }

    pub fn map_nodes(&mut self) {
        self.rows_index.clear();
        self.columns_index.clear();
        self.blocks_index.clear();

        for (row_index, row) in self.template.root.rows.iter().enumerate() {
            self.rows_index.insert(row.id.clone(), row_index);
            for (column_index, column) in row.columns.iter().enumerate() {
                self.columns_index
                    .insert(column.id.clone(), ColumnCoordinates::new(row_index, column_index));
                for (block_index, block) in column.blocks.iter().enumerate() {
                    self.blocks_index.insert(
                        block.id().to_string(),
                        BlockCoordinates::new(row_index, column_index, block_index),
                    );
                }
            }
        }
        trace!(
            rows = self.rows_index.len(),
            columns = self.columns_index.len(),
            blocks = self.blocks_index.len(),
            "template indexed"
        );
    }

    pub fn row_coordinates(&self, id: &str) -> Option<usize> {
        self.rows_index.get(id).copied()
    }

    pub fn column_coordinates(&self, id: &str) -> Option<ColumnCoordinates> {
        self.columns_index.get(id).copied()
    }

    pub fn block_coordinates(&self, id: &str) -> Option<BlockCoordinates> {
        self.blocks_index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        let root = &self.template.root;
        if root.id == id {
            return Some(NodeRef::Root(root));
        }
        if let Some(index) = self.row_coordinates(id) {
            return self.row(index).ok().map(NodeRef::Row);
        }
        if let Some(coordinates) = self.column_coordinates(id) {
            return self.column(coordinates).ok().map(NodeRef::Column);
        }
        let coordinates = self.block_coordinates(id)?;
        self.block(coordinates).ok().map(NodeRef::Block)
    }

    /// Blocks of the given kinds in document order.
    pub fn blocks_by_types(&self, kinds: &[BlockType]) -> Vec<(BlockCoordinates, &BlockEntity)> {
        let mut found = Vec::new();
        for (row_index, row) in self.template.root.rows.iter().enumerate() {
            for (column_index, column) in row.columns.iter().enumerate() {
                for (block_index, block) in column.blocks.iter().enumerate() {
                    if kinds.contains(&block.kind()) {
                        let coordinates = BlockCoordinates::new(row_index, column_index, block_index);
                        found.push((coordinates, block));
                    }
                }
            }
        }
        found
    }

    /// Every indexed id, the root's included.
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = vec![self.template.root.id.clone()];
        ids.extend(self.rows_index.keys().cloned());
        ids.extend(self.columns_index.keys().cloned());
        ids.extend(self.blocks_index.keys().cloned());
        ids
    }

    pub fn rows(&self) -> &[RowEntity] {
        &self.template.root.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<RowEntity> {
        &mut self.template.root.rows
    }

    pub fn row(&self, index: usize) -> Result<&RowEntity, TemplateError> {
        let rows = &self.template.root.rows;
        rows.get(index).ok_or(TemplateError::RowOutOfRange {
            index,
            len: rows.len(),
        })
    }

    pub fn row_mut(&mut self, index: usize) -> Result<&mut RowEntity, TemplateError> {
        let rows = &mut self.template.root.rows;
        let len = rows.len();
        rows.get_mut(index)
            .ok_or(TemplateError::RowOutOfRange { index, len })
    }

    pub fn column(&self, at: ColumnCoordinates) -> Result<&ColumnEntity, TemplateError> {
        let columns = &self.row(at.row_index)?.columns;
        columns.get(at.column_index).ok_or(TemplateError::ColumnOutOfRange {
            row: at.row_index,
            index: at.column_index,
            len: columns.len(),
        })
    }

    pub fn column_mut(&mut self, at: ColumnCoordinates) -> Result<&mut ColumnEntity, TemplateError> {
        let columns = &mut self.row_mut(at.row_index)?.columns;
        let len = columns.len();
        columns.get_mut(at.column_index).ok_or(TemplateError::ColumnOutOfRange {
            row: at.row_index,
            index: at.column_index,
            len,
        })
    }

    pub fn block(&self, at: BlockCoordinates) -> Result<&BlockEntity, TemplateError> {
        let blocks = &self.column(at.column())?.blocks;
        blocks.get(at.block_index).ok_or(TemplateError::BlockOutOfRange {
            row: at.row_index,
            column: at.column_index,
            index: at.block_index,
            len: blocks.len(),
        })
    }

    pub fn block_mut(&mut self, at: BlockCoordinates) -> Result<&mut BlockEntity, TemplateError> {
        let blocks = &mut self.column_mut(at.column())?.blocks;
        let len = blocks.len();
        blocks.get_mut(at.block_index).ok_or(TemplateError::BlockOutOfRange {
            row: at.row_index,
            column: at.column_index,
            index: at.block_index,
            len,
        })
    }

    pub fn block_by_id(&self, id: &str) -> Result<&BlockEntity, TemplateError> {
        let coordinates = self
            .block_coordinates(id)
            .ok_or_else(|| TemplateError::UnknownNode(id.to_string()))?;
        self.block(coordinates)
    }
}
