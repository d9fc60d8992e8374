use tracing::warn;

use crate::plugin::{Extension, KeyBinding};
use crate::schema::{DomSpec, NodeSpec};

/// A `<br>` inside a text block. Enter inserts one instead of splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardBreak;

impl Extension for HardBreak {
    fn name(&self) -> &str {
        "hardBreak"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("hardBreak")
                .inline()
                .group("inline")
                .to_dom(|_| DomSpec::element("br")),
        ]
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        vec![KeyBinding::new("Enter", |props| {
            let Ok(node) = props.schema().node("hardBreak", None, Vec::new()) else {
                return false;
            };
            let selection = props.selection();
            let result = props
                .tr
                .delete(selection.from(), selection.to())
                .and_then(|tr| tr.insert_inline(selection.from(), node));
            match result {
                Ok(_) => true,
                Err(err) => {
                    warn!(%err, "hard break insertion failed");
                    false
                }
            }
        })]
    }
}
