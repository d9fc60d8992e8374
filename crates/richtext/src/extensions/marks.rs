use crate::extensions::outcome;
use crate::plugin::{CommandSpec, Extension, InputRule, KeyBinding, PasteRule};
use crate::rules::{symmetric_mark_input_rule, symmetric_mark_paste_rule};
use crate::schema::{DomSpec, MarkSpec, Schema};
use crate::transforms::marks::{set_mark, toggle_mark, unset_mark};

#[derive(Debug, Clone)]
pub struct FormatMark {
    name: &'static str,
    tag: &'static str,
    style: &'static str,
    delimiter: &'static str,
    shortcut: &'static str,
    excludes: Option<&'static str>,
}

impl FormatMark {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn delimiter(&self) -> &'static str {
        self.delimiter
    }

    fn command_name(&self, verb: &str) -> String {
        let mut chars = self.name.chars();
        let capitalized = chars
            .next()
            .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
            .unwrap_or_default();
        format!("{verb}{capitalized}")
    }
}

pub fn bold() -> FormatMark {
    FormatMark {
        name: "bold",
        tag: "b",
        style: "font-weight: bold;",
        delimiter: "**",
        shortcut: "Mod-b",
        excludes: None,
    }
}

pub fn italic() -> FormatMark {
    FormatMark {
        name: "italic",
        tag: "i",
        style: "font-style: italic;",
        delimiter: "_",
        shortcut: "Mod-i",
        excludes: None,
    }
}

pub fn strike() -> FormatMark {
    FormatMark {
        name: "strike",
        tag: "s",
        style: "text-decoration: line-through;",
        delimiter: "~~",
        shortcut: "Mod-Shift-s",
        excludes: None,
    }
}

pub fn subscript() -> FormatMark {
    FormatMark {
        name: "subscript",
        tag: "sub",
        style: "vertical-align: sub;",
        delimiter: "~",
        shortcut: "Mod-,",
        excludes: Some("superscript"),
    }
}

pub fn superscript() -> FormatMark {
    FormatMark {
        name: "superscript",
        tag: "sup",
        style: "vertical-align: super;",
        delimiter: "^",
        shortcut: "Mod-.",
        excludes: Some("subscript"),
    }
}

pub fn underline() -> FormatMark {
    FormatMark {
        name: "underline",
        tag: "u",
        style: "text-decoration: underline;",
        delimiter: "__",
        shortcut: "Mod-u",
        excludes: None,
    }
}

impl Extension for FormatMark {
    fn name(&self) -> &str {
        self.name
    }

    fn marks(&self) -> Vec<MarkSpec> {
        let tag = self.tag;
        let style = self.style;
        let spec = MarkSpec::new(self.name).to_dom(move |_| DomSpec::wrapping(tag).attr("style", style));
        // A mark always excludes itself; naming the other kind keeps that.
        let spec = match self.excludes {
            Some(other) => spec.excludes(format!("{} {other}", self.name)),
            None => spec,
        };
        vec![spec]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let kind = self.name;
        let toggle = self.command_name("toggle");
        let set = self.command_name("set");
        let unset = self.command_name("unset");
        vec![
            CommandSpec::new(toggle.clone(), move |props, _| {
                outcome(&toggle, toggle_mark(props.tr, kind, None))
            })
            .requires_marks([kind]),
            CommandSpec::new(set.clone(), move |props, _| outcome(&set, set_mark(props.tr, kind, None)))
                .requires_marks([kind]),
            CommandSpec::new(unset.clone(), move |props, _| outcome(&unset, unset_mark(props.tr, kind)))
                .requires_marks([kind]),
        ]
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        let kind = self.name;
        vec![KeyBinding::new(self.shortcut, move |props| {
            outcome(kind, toggle_mark(props.tr, kind, None))
        })]
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        if !schema.has_mark(self.name) {
            return Vec::new();
        }
        symmetric_mark_input_rule(self.name, self.delimiter).into_iter().collect()
    }

    fn paste_rules(&self, schema: &Schema) -> Vec<PasteRule> {
        if !schema.has_mark(self.name) {
            return Vec::new();
        }
        symmetric_mark_paste_rule(self.name, self.delimiter).into_iter().collect()
    }
}
