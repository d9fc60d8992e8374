#![allow(dead_code)]

use mailkit_template::{
    BlockEntity, ColumnEntity, RichtextContent, RootEntity, RowEntity, TemplateEntity,
    TemplateHistory, TemplateStore,
};
use serde_json::{Value, json};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn text_content(text: &str) -> RichtextContent {
    RichtextContent {
        html: format!("<p>{text}</p>"),
        json: json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
        }),
    }
}

pub fn button_content(label: &str) -> RichtextContent {
    RichtextContent {
        html: label.to_string(),
        json: json!({ "type": "doc", "content": [{ "type": "text", "text": label }] }),
    }
}

pub fn column(width: u32, blocks: Vec<BlockEntity>) -> ColumnEntity {
    ColumnEntity::new(width, blocks)
}

pub fn row_with_widths(widths: &[u32]) -> RowEntity {
    RowEntity::new(widths.iter().map(|width| column(*width, Vec::new())).collect())
}

/// Two rows:
/// row 0 has two 50 columns, the first with a text and a button block,
/// the second with one text block; row 1 has a single full-width column
/// with one text block.
pub fn sample_template() -> TemplateEntity {
    let first = RowEntity::new(vec![
        column(
            50,
            vec![
                BlockEntity::text(text_content("one")),
                BlockEntity::button(button_content("Go")),
            ],
        ),
        column(50, vec![BlockEntity::text(text_content("two"))]),
    ]);
    let second = RowEntity::new(vec![column(100, vec![BlockEntity::text(text_content("three"))])]);
    TemplateEntity::new(RootEntity::new(vec![first, second]))
}

pub fn sample_store() -> TemplateStore {
    TemplateStore::new(sample_template())
}

pub fn store_with_row(widths: &[u32]) -> TemplateStore {
    TemplateStore::new(TemplateEntity::new(RootEntity::new(vec![row_with_widths(widths)])))
}

pub fn history() -> TemplateHistory {
    TemplateHistory::new()
}

pub fn snapshot(store: &TemplateStore) -> Value {
    serde_json::to_value(store.template()).unwrap_or_default()
}

pub fn widths(store: &TemplateStore, row: usize) -> Vec<u32> {
    store.rows()[row].columns.iter().map(|column| column.width).collect()
}

/// Concatenated text of every text node in a rich text document.
pub fn plain_text(json: &Value) -> String {
    let mut out = String::new();
    collect_text(json, &mut out);
    out
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}
