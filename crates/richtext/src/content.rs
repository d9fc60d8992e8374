use serde_json::Value;

use crate::core::Node;
use crate::error::{ContentError, SchemaError};
use crate::schema::Schema;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Content {
    /// Document JSON, a single node, or an array of top-level nodes.
    Json(Value),
    Doc(Node),
    #[default]
    Empty,
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Json(value)
    }
}

impl From<Node> for Content {
    fn from(node: Node) -> Self {
        Content::Doc(node)
    }
}

/// Builds a checked document from `content`. Empty content yields the
/// smallest valid document.
pub fn parse_content(schema: &Schema, content: &Content) -> Result<Node, ContentError> {
    let top = schema.top_node();
    let doc = match content {
        Content::Empty | Content::Json(Value::Null) => schema.create_and_fill(top, None)?,
        Content::Json(Value::String(_)) => return Err(ContentError::Html),
        Content::Json(Value::Array(items)) => {
            let mut children = Vec::with_capacity(items.len());
            for item in items {
                children.push(schema.adopt(serde_json::from_value(item.clone())?)?);
            }
            schema.node(top, None, children)?
        }
        Content::Json(value) => {
            let raw: Node = serde_json::from_value(value.clone())?;
            wrap_in_top(schema, schema.adopt(raw)?)?
        }
        Content::Doc(node) => wrap_in_top(schema, schema.adopt(node.clone())?)?,
    };
    schema.check(&doc)?;
    Ok(doc)
}

fn wrap_in_top(schema: &Schema, node: Node) -> Result<Node, SchemaError> {
    if node.kind == schema.top_node() {
        return Ok(node);
    }
    schema.node(schema.top_node(), None, vec![node])
}
