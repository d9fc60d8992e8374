use thiserror::Error;

use crate::ops::Path;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),
    #[error("unknown mark type `{0}`")]
    UnknownMarkType(String),
    #[error("schema has no `{0}` node type")]
    MissingTopNode(String),
    #[error("invalid content expression `{expr}` on `{node}`: {reason}")]
    InvalidContentExpr {
        node: String,
        expr: String,
        reason: String,
    },
    #[error("invalid content for node `{0}`")]
    InvalidContent(String),
    #[error("mark `{mark}` is not allowed in `{node}`")]
    MarkNotAllowed { node: String, mark: String },
    #[error("empty text nodes are not allowed")]
    EmptyText,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: Path, reason: String },
    #[error("position {pos} is outside the document (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },
    #[error("position {0} is not inside a text block")]
    NotInTextblock(usize),
    #[error("range {from}..{to} cannot be replaced")]
    InvalidRange { from: usize, to: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ApplyError {
    pub(crate) fn path(path: &[usize], reason: impl Into<String>) -> Self {
        ApplyError::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse content: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTML content is not supported, load document JSON instead")]
    Html,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
