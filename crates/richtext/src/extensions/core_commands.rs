use serde_json::Value;
use tracing::warn;

use crate::content::{Content, parse_content};
use crate::core::Selection;
use crate::extensions::arg_str;
use crate::helpers::{first_text_pos, last_text_pos};
use crate::plugin::{CommandProps, CommandSpec, Extension};

#[derive(Debug, Clone, Copy, Default)]
pub struct CoreCommands;

fn content_args(args: Option<&Value>) -> (Value, bool) {
    match args {
        Some(Value::Object(map)) if map.contains_key("content") && !map.contains_key("type") => {
            let emit = map.get("emitUpdate").and_then(Value::as_bool).unwrap_or(true);
            (map.get("content").cloned().unwrap_or(Value::Null), emit)
        }
        Some(value) => (value.clone(), true),
        None => (Value::Null, true),
    }
}

fn set_content(props: &mut CommandProps<'_>, args: Option<&Value>) -> bool {
    if !props.dispatch {
        return true;
    }
    let (content, emit_update) = content_args(args);
    let doc = match parse_content(props.schema(), &Content::Json(content)) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(%err, "setContent rejected");
            return false;
        }
    };
    props.tr.set_prevent_update(!emit_update);
    let size = props.tr.doc().content_size();
    if let Err(err) = props.tr.replace_with(0, size, doc.content) {
        warn!(%err, "setContent failed");
        return false;
    }
    true
}

fn set_text_selection(props: &mut CommandProps<'_>, args: Option<&Value>) -> bool {
    let (from, to) = match args {
        Some(Value::Number(pos)) => {
            let pos = pos.as_u64().unwrap_or(0) as usize;
            (pos, pos)
        }
        Some(Value::Object(range)) => {
            let read = |key: &str| range.get(key).and_then(Value::as_u64).unwrap_or(0) as usize;
            (read("from"), read("to"))
        }
        _ => return false,
    };
    let doc = props.tr.doc();
    let min = first_text_pos(doc, props.schema()).unwrap_or(0);
    let max = last_text_pos(doc, props.schema()).unwrap_or(min);
    let clamp = |pos: usize| pos.max(min).min(max);
    let selection = Selection::new(clamp(from), clamp(to));
    props.tr.set_selection(selection);
    true
}

fn unset_all_marks(props: &mut CommandProps<'_>, _args: Option<&Value>) -> bool {
    let selection = props.selection();
    if selection.is_empty() {
        return true;
    }
    if let Err(err) = props.tr.remove_mark(selection.from(), selection.to(), None) {
        warn!(%err, "unsetAllMarks failed");
    }
    true
}

fn focus(props: &mut CommandProps<'_>, _args: Option<&Value>) -> bool {
    props.tr.meta.focus = true;
    true
}

fn blur(props: &mut CommandProps<'_>, _args: Option<&Value>) -> bool {
    props.tr.meta.blur = true;
    true
}

fn insert_text(props: &mut CommandProps<'_>, args: Option<&Value>) -> bool {
    let Some(text) = arg_str(args, "text") else {
        return false;
    };
    let selection = props.selection();
    match props.tr.insert_text(text, selection.from(), selection.to()) {
        Ok(_) => true,
        Err(err) => {
            warn!(%err, "insertText failed");
            false
        }
    }
}

impl Extension for CoreCommands {
    fn name(&self) -> &str {
        "coreCommands"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setContent", set_content)
                .description("Replace the whole document")
                .args_example(serde_json::json!({ "content": { "type": "doc" }, "emitUpdate": false })),
            CommandSpec::new("setTextSelection", set_text_selection),
            CommandSpec::new("unsetAllMarks", unset_all_marks),
            CommandSpec::new("focus", focus),
            CommandSpec::new("blur", blur),
            CommandSpec::new("insertText", insert_text),
        ]
    }
}
