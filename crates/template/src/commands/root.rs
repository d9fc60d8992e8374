use mailkit_history::Command;

use crate::entity::{RootUpdate, Style};
use crate::error::TemplateError;
use crate::store::TemplateStore;

/// Merges a partial update into the root. Undo restores the root's own
/// attributes; its rows are left alone.
#[derive(Debug)]
pub struct UpdateRootCommand {
    update: RootUpdate,
    previous: Option<(u32, Style)>,
}

impl UpdateRootCommand {
    pub fn new(update: RootUpdate) -> Self {
        Self {
            update,
            previous: None,
        }
    }
}

impl Command<TemplateStore, TemplateError> for UpdateRootCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        let root = &mut store.template_mut().root;
        self.previous = Some((root.width, root.style.clone()));
        self.update.apply_to(root);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if let Some((width, style)) = self.previous.take() {
            let root = &mut store.template_mut().root;
            root.width = width;
            root.style = style;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "root.update"
    }
}
