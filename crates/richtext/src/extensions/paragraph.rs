use crate::extensions::outcome;
use crate::plugin::{CommandSpec, Extension};
use crate::schema::{DomSpec, NodeSpec};

#[derive(Debug, Clone, Copy, Default)]
pub struct Paragraph;

impl Extension for Paragraph {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("paragraph")
                .content("inline*")
                .group("block")
                .to_dom(|_| DomSpec::wrapping("p")),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setParagraph", |props, _| {
                let selection = props.selection();
                let result = props
                    .tr
                    .set_block_type(selection.from(), selection.to(), "paragraph", None);
                outcome("setParagraph", result)
            })
            .requires_nodes(["paragraph"]),
        ]
    }
}
