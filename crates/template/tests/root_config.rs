mod support;

use std::collections::BTreeMap;

use mailkit_history::CommandType;
use mailkit_template::{
    RootUpdate, TemplateConfigUpdate, TemplateEntity, TypographyConfig, UpdateRootCommand,
    UpdateTemplateConfigCommand, stringify_css_object,
};
use serde_json::json;
use support::{history, sample_store, sample_template, snapshot};

#[test]
fn root_update_merges_and_undoes() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);

    let update = RootUpdate {
        width: Some(640),
        style: Some(BTreeMap::from([("backgroundColor".to_string(), json!("#f4f4f4"))])),
    };
    history.execute_command(&mut store, UpdateRootCommand::new(update), CommandType::RootUpdateWidth)?;
    let root = &store.template().root;
    assert_eq!(root.width, 640);
    assert_eq!(
        stringify_css_object(Some(&root.style)).as_deref(),
        Some("background-color: #f4f4f4")
    );
    assert_eq!(root.rows.len(), 2);

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn config_update_replaces_whole_slots() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    store.template_mut().config.paragraph = Some(TypographyConfig {
        color: Some("#111111".into()),
        line_height: Some("1.5".into()),
        ..TypographyConfig::default()
    });
    let before = snapshot(&store);

    let update = TemplateConfigUpdate {
        paragraph: Some(TypographyConfig {
            font_size: Some("16px".into()),
            ..TypographyConfig::default()
        }),
        button: Some(BTreeMap::from([("borderRadius".to_string(), json!("4px"))])),
        ..TemplateConfigUpdate::default()
    };
    history.execute_command(
        &mut store,
        UpdateTemplateConfigCommand::new(update),
        CommandType::TemplateGlobalStyles,
    )?;
    let config = &store.template().config;
    let paragraph = config.paragraph.clone().unwrap_or_default();
    assert_eq!(paragraph.font_size.as_deref(), Some("16px"));
    assert_eq!(paragraph.color, None);
    assert!(config.button.is_some());
    assert!(config.h1.is_none());

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn global_styles_collect_each_slot() {
    let mut config = sample_template().config;
    config.paragraph = Some(TypographyConfig {
        font_size: Some("14px".into()),
        ..TypographyConfig::default()
    });
    config.h2 = Some(TypographyConfig {
        font_size: Some("24px".into()),
        color: Some("#222222".into()),
        ..TypographyConfig::default()
    });
    config.link = Some(TypographyConfig {
        color: Some("#0000ff".into()),
        ..TypographyConfig::default()
    });

    let styles = config.global_styles();
    assert_eq!(styles.font_size.paragraph.as_deref(), Some("14px"));
    assert_eq!(styles.font_size.heading.get(&2).map(String::as_str), Some("24px"));
    assert!(styles.font_size.heading.get(&1).is_none());
    assert_eq!(styles.color.link.as_deref(), Some("#0000ff"));
    assert_eq!(styles.color.paragraph, None);
}

#[test]
fn templates_round_trip_through_json() -> anyhow::Result<()> {
    let template = sample_template();
    let encoded = serde_json::to_value(&template)?;
    assert_eq!(encoded["root"]["type"], "root");
    assert_eq!(encoded["root"]["rows"][0]["type"], "row");
    assert_eq!(encoded["root"]["rows"][0]["isResponsive"], true);
    assert_eq!(encoded["root"]["rows"][0]["columns"][0]["blocks"][1]["type"], "button");

    let decoded: TemplateEntity = serde_json::from_value(encoded)?;
    assert_eq!(decoded, template);
    Ok(())
}
