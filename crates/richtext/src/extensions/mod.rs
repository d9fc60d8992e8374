//! Built-in extensions and the bundles text and button blocks use.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::ApplyError;
use crate::plugin::Extension;

mod core_commands;
mod document;
mod hard_break;
mod heading;
mod indentation;
mod keymap;
mod link;
mod lists;
mod marks;
mod paragraph;
mod symbols;
pub mod table;
mod text_align;
mod text_direction;
mod text_style;

pub use core_commands::CoreCommands;
pub use document::{Document, Text};
pub use hard_break::HardBreak;
pub use heading::{HEADING_LEVELS, Heading};
pub use indentation::Indentation;
pub use keymap::BaseKeymap;
pub use link::{LINK_HIGHLIGHT_CLASS, Link, LinkData, LinkProtocol, build_link_href, parse_link_href};
pub use lists::{BulletList, ListItem, OrderedList};
pub use marks::{FormatMark, bold, italic, strike, subscript, superscript, underline};
pub use paragraph::Paragraph;
pub use symbols::EmojiSymbols;
pub use table::{Table, TableCell, TableHeader, TableRow};
pub use text_align::TextAlign;
pub use text_direction::TextDirection;
pub use text_style::{StyleDefaults, TextStyle, TextStyleKind};

/// Template-level fallbacks for text styles, applied when a paragraph,
/// heading or link does not carry its own value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStyles {
    pub color: StyleDefaults,
    pub font_size: StyleDefaults,
    pub font_family: StyleDefaults,
    pub line_height: StyleDefaults,
    pub letter_spacing: StyleDefaults,
}

pub fn text_extensions(styles: &GlobalStyles) -> Vec<Arc<dyn Extension>> {
    vec![
        Arc::new(bold()),
        Arc::new(italic()),
        Arc::new(strike()),
        Arc::new(subscript()),
        Arc::new(superscript()),
        Arc::new(underline()),
        Arc::new(Link::default()),
        Arc::new(Document::default()),
        Arc::new(Text),
        Arc::new(Paragraph),
        Arc::new(Heading),
        Arc::new(BulletList),
        Arc::new(OrderedList),
        Arc::new(ListItem),
        Arc::new(Table),
        Arc::new(TableRow),
        Arc::new(TableCell),
        Arc::new(TableHeader),
        Arc::new(TextAlign),
        Arc::new(TextDirection),
        Arc::new(Indentation),
        Arc::new(TextStyle::new(TextStyleKind::FontSize, styles.font_size.clone())),
        Arc::new(TextStyle::new(TextStyleKind::FontFamily, styles.font_family.clone())),
        Arc::new(TextStyle::new(TextStyleKind::LineHeight, styles.line_height.clone())),
        Arc::new(TextStyle::new(TextStyleKind::LetterSpacing, styles.letter_spacing.clone())),
        Arc::new(TextStyle::new(TextStyleKind::Color, styles.color.clone())),
        Arc::new(TextStyle::new(TextStyleKind::BackgroundColor, StyleDefaults::default())),
        Arc::new(EmojiSymbols),
    ]
}

pub fn button_extensions() -> Vec<Arc<dyn Extension>> {
    vec![
        Arc::new(Document::new("(text | hardBreak)*")),
        Arc::new(Text),
        Arc::new(HardBreak),
    ]
}

pub(crate) fn arg_str<'a>(args: Option<&'a Value>, key: &str) -> Option<&'a str> {
    match args? {
        Value::String(value) => Some(value),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    }
}

pub(crate) fn arg_i64(args: Option<&Value>, key: &str) -> Option<i64> {
    match args? {
        Value::Number(value) => value.as_i64(),
        Value::Object(map) => map.get(key).and_then(Value::as_i64),
        _ => None,
    }
}

pub(crate) fn arg_f64(args: Option<&Value>, key: &str) -> Option<f64> {
    match args? {
        Value::Number(value) => value.as_f64(),
        Value::Object(map) => map.get(key).and_then(Value::as_f64),
        _ => None,
    }
}

pub(crate) fn outcome(command: &str, result: Result<bool, ApplyError>) -> bool {
    match result {
        Ok(done) => done,
        Err(err) => {
            warn!(command, %err, "command failed");
            false
        }
    }
}
