mod support;

use std::collections::BTreeMap;

use mailkit_history::CommandType;
use mailkit_template::{
    BlockCoordinates, BlockEntity, BlockType, RichtextContent, RichtextService, TemplateConfig, TemplateError,
    TypographyConfig, apply_global_styles, transform_block, transform_button_block,
};
use serde_json::{Value, json};
use support::{history, sample_store, snapshot, text_content};

fn paragraph_config() -> TemplateConfig {
    TemplateConfig {
        paragraph: Some(TypographyConfig {
            color: Some("#333333".into()),
            font_size: Some("16px".into()),
            ..TypographyConfig::default()
        }),
        ..TemplateConfig::default()
    }
}

fn block_attr<'a>(json: &'a Value, index: usize, name: &str) -> Option<&'a Value> {
    json["content"][index]["attrs"].get(name)
}

#[test]
fn paragraphs_take_the_configured_typography() -> anyhow::Result<()> {
    let config = paragraph_config();
    let mut service = RichtextService::new(&config)?;
    let content = RichtextContent {
        html: String::new(),
        json: json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "Title" }] },
                { "type": "paragraph", "content": [{ "type": "text", "text": "Body" }] }
            ]
        }),
    };
    let block = BlockEntity::text(content);

    let command = transform_block(&block, BlockCoordinates::new(0, 0, 0), &config, &mut service)?;
    let Some(command) = command else {
        anyhow::bail!("expected an update");
    };
    let Some(updated) = command.update().content.as_ref() else {
        anyhow::bail!("expected new content");
    };
    assert_eq!(block_attr(&updated.json, 1, "color"), Some(&json!("#333333")));
    assert_eq!(block_attr(&updated.json, 1, "fontSize"), Some(&json!("16px")));
    assert_ne!(block_attr(&updated.json, 0, "color"), Some(&json!("#333333")));
    assert!(updated.html.contains("#333333"));
    assert!(command.update().style.is_none());
    Ok(())
}

#[test]
fn nothing_to_do_without_configured_slots() -> anyhow::Result<()> {
    let config = TemplateConfig::default();
    let mut service = RichtextService::new(&config)?;
    let block = BlockEntity::text(text_content("plain"));

    assert!(transform_block(&block, BlockCoordinates::new(0, 0, 0), &config, &mut service)?.is_none());
    assert!(transform_button_block(&block, BlockCoordinates::new(0, 0, 0), &config).is_none());

    let store = sample_store();
    assert!(apply_global_styles(&store, &mut service)?.is_none());
    Ok(())
}

#[test]
fn button_style_is_merged_over_the_block_style() {
    let config = TemplateConfig {
        button: Some(BTreeMap::from([
            ("backgroundColor".to_string(), json!("#ff0000")),
            ("borderRadius".to_string(), json!("4px")),
        ])),
        ..TemplateConfig::default()
    };
    let mut block = BlockEntity::button(RichtextContent::default());
    block.style_mut().insert("backgroundColor".into(), json!("#000000"));
    block.style_mut().insert("padding".into(), json!("10px"));

    let command = transform_button_block(&block, BlockCoordinates::new(0, 0, 1), &config);
    let style = command.and_then(|command| command.update().style.clone()).unwrap_or_default();
    assert_eq!(style.get("backgroundColor"), Some(&json!("#ff0000")));
    assert_eq!(style.get("borderRadius"), Some(&json!("4px")));
    assert_eq!(style.get("padding"), Some(&json!("10px")));
}

#[test]
fn global_styles_apply_as_one_history_entry() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let mut config = paragraph_config();
    config.button = Some(BTreeMap::from([("color".to_string(), json!("#ffffff"))]));
    store.template_mut().config = config.clone();
    let before = snapshot(&store);

    let mut service = RichtextService::new(&config)?;
    let Some(batch) = apply_global_styles(&store, &mut service)? else {
        anyhow::bail!("expected updates");
    };
    assert_eq!(batch.len(), 4);
    history.execute_command(&mut store, batch, CommandType::TemplateGlobalStyles)?;
    assert_eq!(history.timeline().len(), 1);

    for (_, block) in store.blocks_by_types(&[BlockType::Text]) {
        assert_eq!(block_attr(&block.content().json, 0, "color"), Some(&json!("#333333")));
    }
    let button = store.block(BlockCoordinates::new(0, 0, 1))?;
    assert_eq!(button.style().get("color"), Some(&json!("#ffffff")));

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn callback_errors_abort_the_transform() -> anyhow::Result<()> {
    let config = TemplateConfig::default();
    let mut service = RichtextService::new(&config)?;

    let mut seen = 0;
    let result = service.apply_transform(
        &text_content("x"),
        |ctx| ctx.node.kind == "paragraph",
        |_, tr| {
            seen += 1;
            tr.set_node_attribute(999, "color", "#000000")?;
            Ok(())
        },
    );
    assert!(matches!(result, Err(TemplateError::Transform(_))));
    assert_eq!(seen, 1);

    service.update_config(&paragraph_config())?;
    assert_eq!(service.config(), &paragraph_config());
    Ok(())
}
