use mailkit_history::Command;

use crate::config::{TemplateConfig, TemplateConfigUpdate};
use crate::error::TemplateError;
use crate::store::TemplateStore;

/// Replaces the config slots present in the update, each one whole.
#[derive(Debug)]
pub struct UpdateTemplateConfigCommand {
    update: TemplateConfigUpdate,
    previous: Option<TemplateConfig>,
}

impl UpdateTemplateConfigCommand {
    pub fn new(update: TemplateConfigUpdate) -> Self {
        Self {
            update,
            previous: None,
        }
    }
}

impl Command<TemplateStore, TemplateError> for UpdateTemplateConfigCommand {
    fn execute(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        let config = &mut store.template_mut().config;
        self.previous = Some(config.clone());
        self.update.apply_to(config);
        Ok(())
    }

    fn undo(&mut self, store: &mut TemplateStore) -> Result<(), TemplateError> {
        if let Some(previous) = self.previous.take() {
            store.template_mut().config = previous;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "template.config"
    }
}
