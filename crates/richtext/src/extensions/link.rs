use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::core::{Attrs, char_len};
use crate::editor::EditorState;
use crate::extensions::arg_str;
use crate::ops::Transaction;
use crate::plugin::{CommandProps, CommandSpec, Decoration, Extension, InputRule, PasteRule, RuleMatch};
use crate::rules::mark_paste_rule;
use crate::schema::{AttrSpec, DomSpec, MarkSpec, Schema};
use crate::traverse::traverse_in_range;

pub const LINK_HIGHLIGHT_CLASS: &str = "selection-within-link";

const LINK_INPUT_PATTERN: &str = r"(?:^|\s)\[([^\]]+)\]\(([^)]+)\)$";
const LINK_PASTE_PATTERN: &str = r"(https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_+.~#?&/=]*))";

static URL_PARTS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*)://([^/?#]+)([^?#]*)").ok());

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkProtocol {
    Https,
    Mailto,
    Tel,
    Ftp,
    Other(String),
}

impl LinkProtocol {
    pub const OFFERED: [LinkProtocol; 4] = [
        LinkProtocol::Https,
        LinkProtocol::Mailto,
        LinkProtocol::Tel,
        LinkProtocol::Ftp,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LinkProtocol::Https => "https",
            LinkProtocol::Mailto => "mailto",
            LinkProtocol::Tel => "tel",
            LinkProtocol::Ftp => "ftp",
            LinkProtocol::Other(other) => other,
        }
    }
}

impl fmt::Display for LinkProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkProtocol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "https" => LinkProtocol::Https,
            "mailto" => LinkProtocol::Mailto,
            "tel" => LinkProtocol::Tel,
            "ftp" => LinkProtocol::Ftp,
            other => LinkProtocol::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub protocol: LinkProtocol,
    pub address: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}

impl LinkData {
    pub fn new(protocol: LinkProtocol, address: impl Into<String>) -> Self {
        Self {
            protocol,
            address: address.into(),
            subject: None,
            body: None,
        }
    }
}

fn form_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => out.push(byte as char),
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).and_then(|digit| u8::try_from(digit).ok())
}

fn form_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut ix = 0;
    while ix < bytes.len() {
        let escaped = match (bytes[ix], bytes.get(ix + 1), bytes.get(ix + 2)) {
            (b'%', Some(&hi), Some(&lo)) => hex_value(hi).zip(hex_value(lo)),
            _ => None,
        };
        match (escaped, bytes[ix]) {
            (Some((hi, lo)), _) => {
                out.push(hi * 16 + lo);
                ix += 3;
                continue;
            }
            (None, b'+') => out.push(b' '),
            (None, byte) => out.push(byte),
        }
        ix += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(name, _)| form_decode(name) == key)
        .map(|(_, value)| form_decode(value))
        .filter(|value| !value.is_empty())
}

pub fn build_link_href(data: &LinkData) -> String {
    match data.protocol {
        LinkProtocol::Mailto => {
            let params: Vec<String> = [("subject", &data.subject), ("body", &data.body)]
                .into_iter()
                .filter_map(|(key, value)| {
                    value
                        .as_deref()
                        .filter(|value| !value.is_empty())
                        .map(|value| format!("{key}={}", form_encode(value)))
                })
                .collect();
            if params.is_empty() {
                format!("mailto:{}", data.address)
            } else {
                format!("mailto:{}?{}", data.address, params.join("&"))
            }
        }
        LinkProtocol::Tel => format!("tel:{}", data.address),
        ref protocol => format!("{protocol}://{}", data.address),
    }
}

/// Splits `href` back into link form parts. `None` when it is neither a
/// `mailto:`/`tel:` target nor an absolute URL.
pub fn parse_link_href(href: &str) -> Option<LinkData> {
    if let Some(mail) = href.strip_prefix("mailto:") {
        let (address, query) = mail.split_once('?').unwrap_or((mail, ""));
        return Some(LinkData {
            protocol: LinkProtocol::Mailto,
            address: address.to_string(),
            subject: query_param(query, "subject"),
            body: query_param(query, "body"),
        });
    }
    if let Some(number) = href.strip_prefix("tel:") {
        return Some(LinkData::new(LinkProtocol::Tel, number));
    }
    let parts = URL_PARTS.as_ref()?.captures(href)?;
    let scheme = parts.get(1)?.as_str().to_ascii_lowercase();
    let host = parts.get(2)?.as_str().to_ascii_lowercase();
    let path = parts.get(3).map_or("", |m| m.as_str());
    let path = if path.is_empty() { "/" } else { path };
    let protocol = scheme.parse().unwrap_or(LinkProtocol::Other(scheme));
    Some(LinkData::new(protocol, format!("{host}{path}")))
}

fn link_attrs(href: &str, title: Option<&str>) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("href".to_string(), Value::from(href));
    attrs.insert("target".to_string(), Value::from("_blank"));
    attrs.insert("rel".to_string(), Value::from("noopener noreferrer"));
    attrs.insert("title".to_string(), title.map_or(Value::Null, Value::from));
    attrs
}

/// `<a>` mark. Not inclusive, so typing at its end leaves the link.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub is_underlined: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self { is_underlined: true }
    }
}

fn set_link(props: &mut CommandProps<'_>, args: Option<&Value>) -> bool {
    let selection = props.selection();
    if selection.is_empty() {
        return false;
    }
    let Some(href) = arg_str(args, "href") else {
        return false;
    };
    let title = args
        .and_then(|args| args.get("title"))
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty());
    let mark = match props.schema().mark("link", Some(&link_attrs(href, title))) {
        Ok(mark) => mark,
        Err(err) => {
            warn!(%err, "setLink rejected");
            return false;
        }
    };
    match props.tr.add_mark(selection.from(), selection.to(), mark) {
        Ok(_) => true,
        Err(err) => {
            warn!(%err, "setLink failed");
            false
        }
    }
}

fn unset_link(props: &mut CommandProps<'_>, _args: Option<&Value>) -> bool {
    let selection = props.selection();
    if !selection.is_empty() {
        if let Err(err) = props.tr.remove_mark(selection.from(), selection.to(), Some("link")) {
            warn!(%err, "unsetLink failed");
            return false;
        }
        return true;
    }
    let doc = props.tr.doc().clone();
    let mut linked = Vec::new();
    traverse_in_range(&doc, selection.from(), selection.to(), true, |ctx| {
        if ctx.mark.is_some_and(|mark| mark.kind == "link") {
            linked.push((ctx.pos, ctx.pos + ctx.node.node_size()));
        }
    });
    for &(from, to) in &linked {
        if let Err(err) = props.tr.remove_mark(from, to, Some("link")) {
            warn!(%err, "unsetLink failed");
            return false;
        }
    }
    !linked.is_empty()
}

fn apply_markdown_link(tr: &mut Transaction, found: &RuleMatch) -> bool {
    let (Some(text), Some(href)) = (found.group(1), found.group(2)) else {
        return false;
    };
    let leading = found.text.chars().take_while(|c| c.is_whitespace()).count();
    let start = found.from + leading;
    let mark = match tr.schema().mark("link", Some(&link_attrs(href, Some(text)))) {
        Ok(mark) => mark,
        Err(err) => {
            warn!(%err, "link rule skipped");
            return false;
        }
    };
    let result = tr
        .insert_text(text, start, found.to)
        .and_then(|tr| tr.add_mark(start, start + char_len(text), mark));
    match result {
        Ok(tr) => {
            tr.remove_stored_mark("link");
            true
        }
        Err(err) => {
            warn!(%err, "link rule failed");
            false
        }
    }
}

impl Extension for Link {
    fn name(&self) -> &str {
        "link"
    }

    fn marks(&self) -> Vec<MarkSpec> {
        vec![
            MarkSpec::new("link")
                .attr("href", AttrSpec::new(""))
                .attr("target", AttrSpec::new("_blank"))
                .attr("rel", AttrSpec::new("noopener noreferrer"))
                .attr("title", AttrSpec::null())
                .attr("isUnderlined", AttrSpec::new(self.is_underlined))
                .inclusive(false)
                .to_dom(|mark| {
                    let mut dom = DomSpec::wrapping("a")
                        .attr("href", mark.attr_str("href").unwrap_or_default())
                        .attr("target", mark.attr_str("target").unwrap_or("_blank"))
                        .attr("rel", mark.attr_str("rel").unwrap_or("noopener noreferrer"));
                    if let Some(title) = mark.attr_str("title").filter(|title| !title.is_empty()) {
                        dom = dom.attr("title", title);
                    }
                    let underlined = mark.attr("isUnderlined").and_then(Value::as_bool).unwrap_or(true);
                    if !underlined {
                        dom = dom.push_style("text-decoration: none");
                    }
                    dom
                }),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("setLink", set_link)
                .requires_marks(["link"])
                .args_example(serde_json::json!({ "href": "https://example.com", "title": "Example" })),
            CommandSpec::new("unsetLink", unset_link).requires_marks(["link"]),
        ]
    }

    fn input_rules(&self, schema: &Schema) -> Vec<InputRule> {
        if !schema.has_mark("link") {
            return Vec::new();
        }
        match Regex::new(LINK_INPUT_PATTERN) {
            Ok(find) => vec![InputRule::new("link:markdown", find, apply_markdown_link)],
            Err(err) => {
                warn!(%err, "invalid link input pattern");
                Vec::new()
            }
        }
    }

    fn paste_rules(&self, schema: &Schema) -> Vec<PasteRule> {
        if !schema.has_mark("link") {
            return Vec::new();
        }
        let attrs = Arc::new(|found: &RuleMatch| found.group(1).map(|href| link_attrs(href, None)));
        mark_paste_rule("link:url", LINK_PASTE_PATTERN, "link", Some(attrs))
            .into_iter()
            .collect()
    }

    fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        if !state.schema().has_mark("link") {
            return Vec::new();
        }
        let mut decorations: Vec<Decoration> = Vec::new();
        let (from, to) = (state.selection.from(), state.selection.to());
        traverse_in_range(&state.doc, from, to, true, |ctx| {
            if !ctx.mark.is_some_and(|mark| mark.kind == "link") {
                return;
            }
            let decoration = Decoration::Inline {
                from: ctx.pos,
                to: ctx.pos + ctx.node.node_size(),
                class: LINK_HIGHLIGHT_CLASS.to_string(),
            };
            if !decorations.contains(&decoration) {
                decorations.push(decoration);
            }
        });
        decorations
    }
}
