//! Undoable structural edits of a [`TemplateStore`].
//!
//! Every command checks its coordinates before touching the tree, so a
//! failed `execute` leaves the store unchanged. Commands that change the
//! tree's shape rebuild the index; attribute updates do not.

use mailkit_history::{BatchCommand, HistoryService};

use crate::error::TemplateError;
use crate::store::TemplateStore;

mod blocks;
mod columns;
mod config;
mod root;
mod rows;

pub use blocks::*;
pub use columns::*;
pub use config::*;
pub use root::*;
pub use rows::*;

pub type TemplateHistory = HistoryService<TemplateStore, TemplateError>;
pub type TemplateBatch = BatchCommand<TemplateStore, TemplateError>;

fn check_row_insert(store: &TemplateStore, index: usize) -> Result<(), TemplateError> {
    let len = store.rows().len();
    if index > len {
        return Err(TemplateError::RowOutOfRange { index, len });
    }
    Ok(())
}
