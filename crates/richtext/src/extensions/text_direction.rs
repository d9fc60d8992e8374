use serde_json::Value;

use crate::extensions::{arg_str, outcome};
use crate::plugin::{CommandSpec, Extension};
use crate::schema::{AttrSpec, NodeSpec};
use crate::transforms::blocks::{set_text_direction, toggle_text_direction};

const DIRECTED_NODES: [&str; 4] = ["paragraph", "heading", "bulletList", "orderedList"];

fn valid_direction(dir: &str) -> bool {
    dir == "ltr" || dir == "rtl"
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextDirection;

impl Extension for TextDirection {
    fn name(&self) -> &str {
        "textDirection"
    }

    fn extend_nodes(&self, nodes: &mut [NodeSpec]) {
        for spec in nodes.iter_mut().filter(|spec| DIRECTED_NODES.contains(&spec.name.as_str())) {
            spec.add_attr("textDirection", AttrSpec::null());
            spec.wrap_to_dom(|node, dom| {
                if node.attr("textDirection").and_then(Value::as_str) == Some("rtl") {
                    dom.attr("dir", "rtl")
                } else {
                    dom
                }
            });
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setTextDirection", |props, args| {
                let dir = arg_str(args, "direction");
                if dir.is_some_and(|dir| !valid_direction(dir)) {
                    return false;
                }
                outcome("setTextDirection", set_text_direction(props.tr, dir))
            })
            .args_example(serde_json::json!("rtl")),
            CommandSpec::new("toggleTextDirection", |props, args| {
                let Some(dir) = arg_str(args, "direction").filter(|dir| valid_direction(dir)) else {
                    return false;
                };
                outcome("toggleTextDirection", toggle_text_direction(props.tr, dir))
            }),
        ]
    }
}
