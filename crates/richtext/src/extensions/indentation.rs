use serde_json::Value;

use crate::extensions::{arg_i64, outcome};
use crate::plugin::{CommandSpec, Extension};
use crate::schema::{AttrSpec, NodeSpec};
use crate::transforms::blocks::{BLOCK_MIN_INDENTATION, LIST_MIN_INDENTATION, set_indentation};

#[derive(Debug, Clone, Copy, Default)]
pub struct Indentation;

impl Extension for Indentation {
    fn name(&self) -> &str {
        "indentation"
    }

    fn extend_nodes(&self, nodes: &mut [NodeSpec]) {
        for spec in nodes.iter_mut() {
            let default = match spec.name.as_str() {
                "paragraph" | "heading" => BLOCK_MIN_INDENTATION,
                "bulletList" | "orderedList" => LIST_MIN_INDENTATION,
                _ => continue,
            };
            spec.add_attr("indentation", AttrSpec::new(default));
            spec.wrap_to_dom(|node, dom| {
                let indentation = node.attr("indentation").and_then(Value::as_f64).unwrap_or(0.0);
                if indentation == 0.0 {
                    return dom;
                }
                let side = match node.attr("textDirection").and_then(Value::as_str) {
                    Some("rtl") => "padding-right",
                    _ => "padding-left",
                };
                dom.push_style(format!("{side}: {indentation}px"))
            });
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setIndentation", |props, args| {
                let Some(delta) = arg_i64(args, "delta") else {
                    return false;
                };
                outcome("setIndentation", set_indentation(props.tr, delta))
            })
            .args_example(serde_json::json!(40)),
        ]
    }
}
