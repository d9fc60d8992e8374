use serde_json::Value;

use crate::core::Attrs;
use crate::extensions::{arg_i64, outcome};
use crate::plugin::{CommandProps, CommandSpec, Extension, InputRule};
use crate::rules::textblock_type_input_rule;
use crate::schema::{AttrSpec, DomSpec, NodeSpec, Schema};

pub const HEADING_LEVELS: [u8; 6] = [1, 2, 3, 4, 5, 6];

#[derive(Debug, Clone, Copy, Default)]
pub struct Heading;

fn level_attrs(level: i64) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("level".to_string(), Value::from(level));
    attrs
}

/// Turns the selected blocks into headings of `level`, or back into
/// paragraphs when they already are.
fn toggle_heading(props: &mut CommandProps<'_>, args: Option<&Value>) -> bool {
    let Some(level) = arg_i64(args, "level") else {
        return false;
    };
    if !HEADING_LEVELS.iter().any(|l| i64::from(*l) == level) {
        return false;
    }
    let selection = props.selection();
    let already = props
        .tr
        .doc()
        .resolve(selection.from())
        .is_ok_and(|resolved| {
            let parent = resolved.parent();
            parent.kind == "heading" && parent.attr("level").and_then(Value::as_i64) == Some(level)
        });
    let result = if already {
        props
            .tr
            .set_block_type(selection.from(), selection.to(), "paragraph", None)
    } else {
        props.tr.set_block_type(
            selection.from(),
            selection.to(),
            "heading",
            Some(&level_attrs(level)),
        )
    };
    outcome("toggleHeading", result)
}

impl Extension for Heading {
    fn name(&self) -> &str {
        "heading"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("heading")
                .attr("level", AttrSpec::new(1))
                .content("inline*")
                .group("block")
                .defining()
                .to_dom(|node| {
                    let level = node
                        .attr("level")
                        .and_then(Value::as_u64)
                        .filter(|level| (1..=6).contains(level))
                        .unwrap_or(1);
                    DomSpec::wrapping(format!("h{level}"))
                }),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("toggleHeading", toggle_heading)
                .requires_nodes(["heading", "paragraph"])
                .args_example(serde_json::json!({ "level": 2 })),
        ]
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        if !schema.has_node("heading") {
            return Vec::new();
        }
        HEADING_LEVELS
            .iter()
            .filter_map(|&level| {
                textblock_type_input_rule(
                    &format!("heading:{level}"),
                    &format!(r"^(#{{{level}}})\s$"),
                    "heading",
                    Some(std::sync::Arc::new(move |_| Some(level_attrs(i64::from(level))))),
                )
            })
            .collect()
    }
}
