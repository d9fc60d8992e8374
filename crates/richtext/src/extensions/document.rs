use crate::plugin::Extension;
use crate::schema::{DomSpec, NodeSpec};

pub const DEFAULT_DOC_CONTENT: &str = "block+";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_DOC_CONTENT)
    }
}

impl Extension for Document {
    fn name(&self) -> &str {
        "doc"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::new("doc").content(self.content.clone())]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Extension for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::new("text").group("inline").inline().to_dom(|_| DomSpec::Hole)]
    }
}
