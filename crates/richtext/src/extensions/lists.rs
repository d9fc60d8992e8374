use serde_json::Value;

use crate::extensions::{arg_str, outcome};
use crate::plugin::{CommandSpec, Extension, InputRule, KeyBinding};
use crate::rules::wrapping_input_rule;
use crate::schema::{AttrSpec, DomSpec, NodeSpec, Schema};
use crate::transforms::lists::{
    delete_empty_list_item, lift_list_item, sink_list_item, split_list_item, toggle_list,
};

pub const BULLET_STYLES: [&str; 3] = ["disc", "circle", "square"];
pub const ORDERED_STYLES: [&str; 5] = ["decimal", "lower-alpha", "upper-alpha", "lower-roman", "upper-roman"];

fn list_spec(kind: &'static str, tag: &'static str, default_style: &'static str) -> NodeSpec {
    NodeSpec::new(kind)
        .attr("listStyleType", AttrSpec::new(default_style))
        .content("listItem+")
        .group("block")
        .to_dom(move |node| {
            let style = node
                .attr("listStyleType")
                .and_then(Value::as_str)
                .unwrap_or(default_style);
            DomSpec::wrapping(tag).attr("style", format!("list-style-type: {style};"))
        })
}

fn toggle_command(name: &'static str, kind: &'static str, styles: &'static [&'static str]) -> CommandSpec {
    CommandSpec::new(name, move |props, args| {
        let style = arg_str(args, "listStyleType");
        if style.is_some_and(|style| !styles.contains(&style)) {
            return false;
        }
        outcome(name, toggle_list(props.tr, kind, style))
    })
    .requires_nodes([kind, "listItem"])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BulletList;

impl Extension for BulletList {
    fn name(&self) -> &str {
        "bulletList"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![list_spec("bulletList", "ul", "disc")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            toggle_command("toggleBulletList", "bulletList", &BULLET_STYLES)
                .args_example(serde_json::json!({ "listStyleType": "disc" })),
        ]
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        if !schema.has_node("bulletList") {
            return Vec::new();
        }
        wrapping_input_rule("bulletList:dash", r"^\s*([-*])\s$", "bulletList", None)
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedList;

impl Extension for OrderedList {
    fn name(&self) -> &str {
        "orderedList"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![list_spec("orderedList", "ol", "decimal")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            toggle_command("toggleOrderedList", "orderedList", &ORDERED_STYLES)
                .args_example(serde_json::json!({ "listStyleType": "lower-roman" })),
        ]
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        if !schema.has_node("orderedList") {
            return Vec::new();
        }
        wrapping_input_rule("orderedList:number", r"^(\d+)\.\s$", "orderedList", None)
            .into_iter()
            .collect()
    }
}

/// List items. Outranks other extensions so its keys win inside lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListItem;

impl Extension for ListItem {
    fn name(&self) -> &str {
        "listItem"
    }

    fn priority(&self) -> i32 {
        101
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("listItem")
                .content("(paragraph | heading) block*")
                .defining()
                .to_dom(|_| DomSpec::wrapping("li")),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("sinkListItem", |props, _| outcome("sinkListItem", sink_list_item(props.tr)))
                .requires_nodes(["listItem"]),
            CommandSpec::new("liftListItem", |props, _| outcome("liftListItem", lift_list_item(props.tr)))
                .requires_nodes(["listItem"]),
            CommandSpec::new("splitListItem", |props, _| {
                outcome("splitListItem", split_list_item(props.tr))
            })
            .requires_nodes(["listItem"]),
        ]
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new("Enter", |props| outcome("Enter", split_list_item(props.tr))),
            KeyBinding::new("Tab", |props| outcome("Tab", sink_list_item(props.tr))),
            KeyBinding::new("Shift-Tab", |props| outcome("Shift-Tab", lift_list_item(props.tr))),
            KeyBinding::new("Backspace", |props| outcome("Backspace", delete_empty_list_item(props.tr))),
            KeyBinding::new("Delete", |props| outcome("Delete", delete_empty_list_item(props.tr))),
        ]
    }
}
