use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of history entry kinds, used for audit and analytics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "row.add")]
    RowAdd,
    #[serde(rename = "row.delete")]
    RowDelete,
    #[serde(rename = "row.move")]
    RowMove,
    #[serde(rename = "row.clone")]
    RowClone,
    #[serde(rename = "row.update")]
    RowUpdate,
    #[serde(rename = "block.add")]
    BlockAdd,
    #[serde(rename = "block.delete")]
    BlockDelete,
    #[serde(rename = "block.move")]
    BlockMove,
    #[serde(rename = "block.clone")]
    BlockClone,
    #[serde(rename = "block.update")]
    BlockUpdate,
    #[serde(rename = "root.update.width")]
    RootUpdateWidth,
    #[serde(rename = "root.update.backgroundColor")]
    RootUpdateBackgroundColor,
    #[serde(rename = "root.update.backgroundImage")]
    RootUpdateBackgroundImage,
    #[serde(rename = "template.global.styles")]
    TemplateGlobalStyles,
    #[serde(rename = "template.global.button.styles")]
    TemplateGlobalButtonStyles,
}

impl CommandType {
    pub const ALL: [CommandType; 15] = [
        CommandType::RowAdd,
        CommandType::RowDelete,
        CommandType::RowMove,
        CommandType::RowClone,
        CommandType::RowUpdate,
        CommandType::BlockAdd,
        CommandType::BlockDelete,
        CommandType::BlockMove,
        CommandType::BlockClone,
        CommandType::BlockUpdate,
        CommandType::RootUpdateWidth,
        CommandType::RootUpdateBackgroundColor,
        CommandType::RootUpdateBackgroundImage,
        CommandType::TemplateGlobalStyles,
        CommandType::TemplateGlobalButtonStyles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandType::RowAdd => "row.add",
            CommandType::RowDelete => "row.delete",
            CommandType::RowMove => "row.move",
            CommandType::RowClone => "row.clone",
            CommandType::RowUpdate => "row.update",
            CommandType::BlockAdd => "block.add",
            CommandType::BlockDelete => "block.delete",
            CommandType::BlockMove => "block.move",
            CommandType::BlockClone => "block.clone",
            CommandType::BlockUpdate => "block.update",
            CommandType::RootUpdateWidth => "root.update.width",
            CommandType::RootUpdateBackgroundColor => "root.update.backgroundColor",
            CommandType::RootUpdateBackgroundImage => "root.update.backgroundImage",
            CommandType::TemplateGlobalStyles => "template.global.styles",
            CommandType::TemplateGlobalButtonStyles => "template.global.button.styles",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable metadata attached to a history entry when it is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: CommandType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CommandMetadata {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Caller-supplied part of [`CommandMetadata`]; id and timestamp are assigned
/// by the history service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommandMetadata {
    pub kind: CommandType,
    pub user_id: Option<String>,
}

impl NewCommandMetadata {
    pub fn new(kind: CommandType) -> Self {
        Self {
            kind,
            user_id: None,
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl From<CommandType> for NewCommandMetadata {
    fn from(kind: CommandType) -> Self {
        Self::new(kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl HistoryConfig {
    pub const DEFAULT_MAX_ENTRIES: usize = 200;

    pub fn with_defaults(mut self) -> Self {
        if self.max_entries == 0 {
            self.max_entries = Self::DEFAULT_MAX_ENTRIES;
        }
        self
    }
}
