use serde_json::Value;

use crate::extensions::{arg_str, outcome};
use crate::plugin::{CommandSpec, Extension};
use crate::schema::{AttrSpec, NodeSpec};
use crate::transforms::blocks::toggle_text_align;

pub const ALIGNMENTS: [&str; 4] = ["left", "center", "right", "justify"];

/// `textAlign` on paragraphs and headings. Left is the default and is
/// not rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAlign;

impl Extension for TextAlign {
    fn name(&self) -> &str {
        "textAlign"
    }

    fn extend_nodes(&self, nodes: &mut [NodeSpec]) {
        for spec in nodes.iter_mut().filter(|spec| spec.name == "paragraph" || spec.name == "heading") {
            spec.add_attr("textAlign", AttrSpec::new("left"));
            spec.wrap_to_dom(|node, dom| {
                match node.attr("textAlign").and_then(Value::as_str) {
                    Some(align) if align != "left" => dom.push_style(format!("text-align: {align}")),
                    _ => dom,
                }
            });
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("toggleTextAlign", |props, args| {
                let Some(align) = arg_str(args, "align").filter(|align| ALIGNMENTS.contains(align)) else {
                    return false;
                };
                outcome("toggleTextAlign", toggle_text_align(props.tr, align))
            })
            .args_example(serde_json::json!("center")),
        ]
    }
}
