use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::TemplateConfig;

/// CSS declarations keyed by camelCase property name.
pub type Style = BTreeMap<String, Value>;

pub const DEFAULT_ROOT_WIDTH: u32 = 600;

pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Renders a style map as an inline CSS string, `None` when there is no map.
pub fn stringify_css_object(style: Option<&Style>) -> Option<String> {
    let style = style?;
    let declarations: Vec<String> = style
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!("{}: {value}", camel_to_kebab(key))
        })
        .collect();
    Some(declarations.join("; "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Row,
    Column,
    Text,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Button,
}

impl BlockType {
    pub const ALL: [BlockType; 2] = [BlockType::Text, BlockType::Button];
}

impl From<BlockType> for NodeType {
    fn from(kind: BlockType) -> Self {
        match kind {
            BlockType::Text => NodeType::Text,
            BlockType::Button => NodeType::Button,
        }
    }
}

/// Rich text in both encodings. `json` is canonical; `html` is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichtextContent {
    pub html: String,
    pub json: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntity {
    pub root: RootEntity,
    #[serde(default)]
    pub config: TemplateConfig,
}

impl TemplateEntity {
    pub fn new(root: RootEntity) -> Self {
        Self {
            root,
            config: TemplateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,
    #[serde(default)]
    pub rows: Vec<RowEntity>,
}

impl Default for RootEntity {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RootEntity {
    pub fn new(rows: Vec<RowEntity>) -> Self {
        Self {
            id: generate_id(),
            kind: NodeType::Root,
            width: DEFAULT_ROOT_WIDTH,
            style: Style::new(),
            rows,
        }
    }

    pub fn with_fresh_ids(mut self) -> Self {
        self.id = generate_id();
        self.rows = self.rows.into_iter().map(RowEntity::with_fresh_ids).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,
    #[serde(default)]
    pub separator_size: u32,
    #[serde(default)]
    pub is_responsive: bool,
    #[serde(default)]
    pub columns: Vec<ColumnEntity>,
}

impl RowEntity {
    pub fn new(columns: Vec<ColumnEntity>) -> Self {
        Self {
            id: generate_id(),
            kind: NodeType::Row,
            style: Style::new(),
            separator_size: 0,
            is_responsive: true,
            columns,
        }
    }

    pub fn with_fresh_ids(mut self) -> Self {
        self.id = generate_id();
        self.columns = self.columns.into_iter().map(ColumnEntity::with_fresh_ids).collect();
        self
    }

    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|column| column.width).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,
    pub width: u32,
    #[serde(default)]
    pub blocks: Vec<BlockEntity>,
}

impl ColumnEntity {
    pub fn new(width: u32, blocks: Vec<BlockEntity>) -> Self {
        Self {
            id: generate_id(),
            kind: NodeType::Column,
            style: Style::new(),
            width,
            blocks,
        }
    }

    pub fn with_fresh_ids(mut self) -> Self {
        self.id = generate_id();
        self.blocks = self.blocks.into_iter().map(BlockEntity::with_fresh_ids).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlockEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,
    #[serde(default)]
    pub content: RichtextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonBlockEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Style::is_empty")]
    pub style: Style,
    #[serde(default)]
    pub content: RichtextContent,
}

/// A leaf holding rich text. Serialized with its `type` tag inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockEntity {
    Text(TextBlockEntity),
    Button(ButtonBlockEntity),
}

impl BlockEntity {
    pub fn text(content: RichtextContent) -> Self {
        BlockEntity::Text(TextBlockEntity {
            id: generate_id(),
            style: Style::new(),
            content,
        })
    }

    pub fn button(content: RichtextContent) -> Self {
        BlockEntity::Button(ButtonBlockEntity {
            id: generate_id(),
            style: Style::new(),
            content,
        })
    }

    pub fn kind(&self) -> BlockType {
        match self {
            BlockEntity::Text(_) => BlockType::Text,
            BlockEntity::Button(_) => BlockType::Button,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BlockEntity::Text(block) => &block.id,
            BlockEntity::Button(block) => &block.id,
        }
    }

    pub fn style(&self) -> &Style {
        match self {
            BlockEntity::Text(block) => &block.style,
            BlockEntity::Button(block) => &block.style,
        }
    }

    pub fn style_mut(&mut self) -> &mut Style {
        match self {
            BlockEntity::Text(block) => &mut block.style,
            BlockEntity::Button(block) => &mut block.style,
        }
    }

    pub fn content(&self) -> &RichtextContent {
        match self {
            BlockEntity::Text(block) => &block.content,
            BlockEntity::Button(block) => &block.content,
        }
    }

    pub fn content_mut(&mut self) -> &mut RichtextContent {
        match self {
            BlockEntity::Text(block) => &mut block.content,
            BlockEntity::Button(block) => &mut block.content,
        }
    }

    fn set_id(&mut self, id: String) {
        match self {
            BlockEntity::Text(block) => block.id = id,
            BlockEntity::Button(block) => block.id = id,
        }
    }

    pub fn with_fresh_ids(mut self) -> Self {
        self.set_id(generate_id());
        self
    }
}

/// Partial row update. Present fields replace the row's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_responsive: Option<bool>,
}

impl RowUpdate {
    pub fn apply_to(&self, row: &mut RowEntity) {
        if let Some(style) = &self.style {
            row.style = style.clone();
        }
        if let Some(separator_size) = self.separator_size {
            row.separator_size = separator_size;
        }
        if let Some(is_responsive) = self.is_responsive {
            row.is_responsive = is_responsive;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl ColumnUpdate {
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, column: &mut ColumnEntity) {
        if let Some(style) = &self.style {
            column.style = style.clone();
        }
        if let Some(width) = self.width {
            column.width = width;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<RichtextContent>,
}

impl BlockUpdate {
    pub fn content(content: RichtextContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn style(style: Style) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, block: &mut BlockEntity) {
        if let Some(style) = &self.style {
            *block.style_mut() = style.clone();
        }
        if let Some(content) = &self.content {
            *block.content_mut() = content.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl RootUpdate {
    pub fn apply_to(&self, root: &mut RootEntity) {
        if let Some(width) = self.width {
            root.width = width;
        }
        if let Some(style) = &self.style {
            root.style = style.clone();
        }
    }
}
