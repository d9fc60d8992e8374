//! Rewrites of stored blocks after the template's global styles change.

use tracing::debug;

use crate::commands::{TemplateBatch, UpdateBlockCommand};
use crate::config::TemplateConfig;
use crate::entity::{BlockEntity, BlockType, BlockUpdate};
use crate::error::TemplateError;
use crate::richtext::RichtextService;
use crate::store::{BlockCoordinates, TemplateStore};

/// Writes the paragraph typography of `config` onto every paragraph of a
/// text block. `None` when no paragraph typography is configured.
pub fn transform_text_block(
    block: &BlockEntity,
    at: BlockCoordinates,
    config: &TemplateConfig,
    service: &mut RichtextService,
) -> Result<Option<UpdateBlockCommand>, TemplateError> {
    let Some(paragraph) = config.paragraph.as_ref().filter(|slot| !slot.is_empty()) else {
        return Ok(None);
    };
    let attributes = paragraph.attributes();

    let content = service.apply_transform(
        block.content(),
        |ctx| ctx.mark.is_none() && ctx.node.kind == "paragraph",
        |ctx, tr| {
            for (name, value) in &attributes {
                tr.set_node_attribute(ctx.pos, name, *value)?;
            }
            Ok(())
        },
    )?;
    Ok(Some(UpdateBlockCommand::new(at, BlockUpdate::content(content))))
}

/// Merges the configured button style over a button block's own style.
pub fn transform_button_block(
    block: &BlockEntity,
    at: BlockCoordinates,
    config: &TemplateConfig,
) -> Option<UpdateBlockCommand> {
    let button = config.button.as_ref().filter(|style| !style.is_empty())?;
    let mut style = block.style().clone();
    style.extend(button.iter().map(|(key, value)| (key.clone(), value.clone())));
    Some(UpdateBlockCommand::new(at, BlockUpdate::style(style)))
}

pub fn transform_block(
    block: &BlockEntity,
    at: BlockCoordinates,
    config: &TemplateConfig,
    service: &mut RichtextService,
) -> Result<Option<UpdateBlockCommand>, TemplateError> {
    match block.kind() {
        BlockType::Text => transform_text_block(block, at, config, service),
        BlockType::Button => Ok(transform_button_block(block, at, config)),
    }
}

/// Runs the matching transformer over every block and batches the
/// updates, to be recorded as one `template.global.styles` entry. `None`
/// when no block changes.
pub fn apply_global_styles(
    store: &TemplateStore,
    service: &mut RichtextService,
) -> Result<Option<TemplateBatch>, TemplateError> {
    let config = &store.template().config;
    let mut batch = TemplateBatch::new();
    for (at, block) in store.blocks_by_types(&BlockType::ALL) {
        if let Some(command) = transform_block(block, at, config, service)? {
            batch.add(command);
        }
    }
    debug!(blocks = batch.len(), "global styles planned");
    Ok((!batch.is_empty()).then_some(batch))
}
