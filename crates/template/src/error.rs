use mailkit_richtext::{ApplyError, ContentError};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("column {index} out of range in row {row} ({len} columns)")]
    ColumnOutOfRange { row: usize, index: usize, len: usize },

    #[error("block {index} out of range in column {row}:{column} ({len} blocks)")]
    BlockOutOfRange {
        row: usize,
        column: usize,
        index: usize,
        len: usize,
    },

    #[error("no node with id {0}")]
    UnknownNode(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("rich text transform failed: {0}")]
    Transform(#[from] ApplyError),
}
