use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::core::{Mark, Node};
use crate::error::ApplyError;
use crate::extensions::{arg_str, outcome};
use crate::helpers::is_paragraph_or_heading;
use crate::ops::Transaction;
use crate::plugin::{CommandSpec, Extension};
use crate::schema::{AttrSpec, DomSpec, MarkSpec, NodeSpec};
use crate::traverse::traverse_in_range;

/// Inline style carried both as a mark and as a paragraph/heading attr.
/// The mark name, its single attribute and the block attribute share
/// one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyleKind {
    FontSize,
    FontFamily,
    LineHeight,
    LetterSpacing,
    Color,
    BackgroundColor,
}

impl TextStyleKind {
    pub const ALL: [TextStyleKind; 6] = [
        TextStyleKind::FontSize,
        TextStyleKind::FontFamily,
        TextStyleKind::LineHeight,
        TextStyleKind::LetterSpacing,
        TextStyleKind::Color,
        TextStyleKind::BackgroundColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextStyleKind::FontSize => "fontSize",
            TextStyleKind::FontFamily => "fontFamily",
            TextStyleKind::LineHeight => "lineHeight",
            TextStyleKind::LetterSpacing => "letterSpacing",
            TextStyleKind::Color => "color",
            TextStyleKind::BackgroundColor => "backgroundColor",
        }
    }

    pub fn css_property(self) -> &'static str {
        match self {
            TextStyleKind::FontSize => "font-size",
            TextStyleKind::FontFamily => "font-family",
            TextStyleKind::LineHeight => "line-height",
            TextStyleKind::LetterSpacing => "letter-spacing",
            TextStyleKind::Color => "color",
            TextStyleKind::BackgroundColor => "background-color",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TextStyleKind::FontSize => "FontSize",
            TextStyleKind::FontFamily => "FontFamily",
            TextStyleKind::LineHeight => "LineHeight",
            TextStyleKind::LetterSpacing => "LetterSpacing",
            TextStyleKind::Color => "Color",
            TextStyleKind::BackgroundColor => "BackgroundColor",
        }
    }

    fn companion_marks(self) -> &'static [&'static str] {
        match self {
            TextStyleKind::Color => &["link"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub heading: BTreeMap<u8, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl StyleDefaults {
    fn for_node(&self, node: &Node) -> Option<&str> {
        match node.kind.as_str() {
            "paragraph" => self.paragraph.as_deref(),
            "heading" => {
                let level = node.attr("level").and_then(Value::as_u64).unwrap_or(1);
                u8::try_from(level)
                    .ok()
                    .and_then(|level| self.heading.get(&level))
                    .map(String::as_str)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    kind: TextStyleKind,
    defaults: StyleDefaults,
}

impl TextStyle {
    pub fn new(kind: TextStyleKind, defaults: StyleDefaults) -> Self {
        Self { kind, defaults }
    }

    pub fn kind(&self) -> TextStyleKind {
        self.kind
    }
}

fn style_value(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|value| !value.is_empty())
}

/// Applies `value` (or clears the style for `None`). A range gets the mark.
/// At a cursor, styled text around it is restyled and, unless the cursor
/// itself is styled, the enclosing paragraph or heading takes the value.
fn apply_style(tr: &mut Transaction, kind: TextStyleKind, value: Option<&str>) -> Result<bool, ApplyError> {
    let name = kind.name();
    let selection = tr.selection();
    let mark = match value {
        Some(value) => Some(tr.schema().mark(name, None)?.with_attr(name, value)),
        None => None,
    };

    if !selection.is_empty() {
        match mark {
            Some(mark) => tr.add_mark(selection.from(), selection.to(), mark)?,
            None => tr.remove_mark(selection.from(), selection.to(), Some(name))?,
        };
        return Ok(true);
    }

    let cursor_styled = tr.current_marks().iter().any(|mark| mark.kind == name);
    let doc = tr.doc().clone();
    let wanted = value.map_or(Value::Null, Value::from);
    let mut restyle: Vec<(usize, usize)> = Vec::new();
    let mut blocks: Vec<usize> = Vec::new();
    traverse_in_range(&doc, selection.from(), selection.to(), true, |ctx| {
        if let Some(mark) = ctx.mark {
            let styled_here = mark.kind == name;
            let companion = value.is_some() && kind.companion_marks().contains(&mark.kind.as_str());
            if styled_here || companion {
                let range = (ctx.pos, ctx.pos + ctx.node.node_size());
                if !restyle.contains(&range) {
                    restyle.push(range);
                }
            }
            return;
        }
        if !cursor_styled && is_paragraph_or_heading(ctx.node) && ctx.node.attr(name) != Some(&wanted) {
            blocks.push(ctx.pos);
        }
    });

    let mut changed = false;
    for (from, to) in restyle {
        let current: Option<&Mark> = doc.node_at(from).and_then(|node| node.marks.iter().find(|m| m.kind == name));
        let differs = current.map(|m| m.attr(name)) != mark.as_ref().map(|m| m.attr(name));
        if !differs {
            continue;
        }
        tr.remove_mark(from, to, Some(name))?;
        if let Some(mark) = &mark {
            tr.add_mark(from, to, mark.clone())?;
        }
        changed = true;
    }
    for pos in blocks {
        tr.set_node_attribute(pos, name, wanted.clone())?;
        changed = true;
    }
    trace!(style = name, ?value, changed, "cursor style applied");
    Ok(changed)
}

impl Extension for TextStyle {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn marks(&self) -> Vec<MarkSpec> {
        let name = self.kind.name();
        let property = self.kind.css_property();
        vec![
            MarkSpec::new(name)
                .attr(name, AttrSpec::null())
                .excludes(name)
                .to_dom(move |mark| {
                    let value = style_value(mark.attr(name)).unwrap_or_default();
                    DomSpec::wrapping("span").attr("style", format!("{property}: {value}"))
                }),
        ]
    }

    fn extend_nodes(&self, nodes: &mut [NodeSpec]) {
        let name = self.kind.name();
        let property = self.kind.css_property();
        for spec in nodes.iter_mut().filter(|spec| spec.name == "paragraph" || spec.name == "heading") {
            spec.add_attr(name, AttrSpec::null());
            let defaults = self.defaults.clone();
            spec.wrap_to_dom(move |node, dom| {
                let value = style_value(node.attr(name)).or_else(|| defaults.for_node(node));
                match value {
                    Some(value) => dom.push_style(format!("{property}: {value}")),
                    None => dom,
                }
            });
        }
    }

    fn extend_marks(&self, marks: &mut [MarkSpec]) {
        let name = self.kind.name();
        let property = self.kind.css_property();
        for companion in self.kind.companion_marks() {
            let Some(spec) = marks.iter_mut().find(|spec| spec.name == *companion) else {
                continue;
            };
            spec.add_attr(name, AttrSpec::null());
            let fallback = self.defaults.link.clone();
            spec.wrap_to_dom(move |mark, dom| {
                let value = style_value(mark.attr(name)).or(fallback.as_deref());
                match value {
                    Some(value) => dom.push_style(format!("{property}: {value}")),
                    None => dom,
                }
            });
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let kind = self.kind;
        let set = format!("set{}", kind.suffix());
        let unset = format!("unset{}", kind.suffix());
        vec![
            CommandSpec::new(set.clone(), move |props, args| {
                let Some(value) = arg_str(args, kind.name()) else {
                    warn!(command = %set, "missing style value");
                    return false;
                };
                outcome(&set, apply_style(props.tr, kind, Some(value)))
            })
            .requires_marks([kind.name()])
            .args_example(serde_json::json!({ kind.name(): "inherit" })),
            CommandSpec::new(unset.clone(), move |props, _| {
                outcome(&unset, apply_style(props.tr, kind, None))
            })
            .requires_marks([kind.name()]),
        ]
    }
}
