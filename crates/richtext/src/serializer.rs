use std::collections::HashMap;

use crate::core::{Mark, Node};
use crate::plugin::NodeViewSpec;
use crate::schema::{DomSpec, Schema};

const VOID_TAGS: &[&str] = &["br", "col", "hr", "img", "input", "meta"];

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\"', "&quot;")
        .replace('\'', "&#39;")
}

/// Turns documents into HTML through the schema's `to_dom` specs.
///
/// Adjacent inline nodes sharing a leading run of marks share the
/// elements for those marks, so `<b>a<i>b</i></b>` stays one `<b>`.
pub struct HtmlSerializer<'a> {
    schema: &'a Schema,
    node_views: Option<&'a HashMap<String, NodeViewSpec>>,
}

impl<'a> HtmlSerializer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            node_views: None,
        }
    }

    pub fn with_node_views(mut self, views: &'a HashMap<String, NodeViewSpec>) -> Self {
        self.node_views = Some(views);
        self
    }

    pub fn serialize_content(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_fragment(&node.content, &mut out);
        out
    }

    pub fn serialize_node(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_fragment(&self, nodes: &[Node], out: &mut String) {
        let mut active: Vec<(&Mark, String)> = Vec::new();
        for node in nodes {
            let keep = active
                .iter()
                .zip(&node.marks)
                .take_while(|((open, _), mark)| *open == *mark)
                .count();
            while active.len() > keep {
                if let Some((_, close)) = active.pop() {
                    out.push_str(&close);
                }
            }
            for mark in &node.marks[keep..] {
                let (open, close) = self.mark_tags(mark);
                out.push_str(&open);
                active.push((mark, close));
            }
            self.write_node(node, out);
        }
        while let Some((_, close)) = active.pop() {
            out.push_str(&close);
        }
    }

    fn write_node(&self, node: &Node, out: &mut String) {
        if let Some(text) = &node.text {
            out.push_str(&escape_html(text));
            return;
        }
        let view = self
            .node_views
            .and_then(|views| views.get(&node.kind))
            .map(|view| (view.render)(node));
        let spec = view.or_else(|| {
            self.schema
                .node_spec(&node.kind)
                .and_then(|spec| spec.to_dom.as_ref())
                .map(|to_dom| to_dom(node))
        });
        match spec {
            Some(spec) => {
                let (open, close) = split_spec(&spec);
                out.push_str(&open);
                self.write_fragment(&node.content, out);
                out.push_str(&close);
            }
            None => self.write_fragment(&node.content, out),
        }
    }

    fn mark_tags(&self, mark: &Mark) -> (String, String) {
        self.schema
            .mark_spec(&mark.kind)
            .and_then(|spec| spec.to_dom.as_ref())
            .map(|to_dom| split_spec(&to_dom(mark)))
            .unwrap_or_default()
    }
}

pub fn render_dom(spec: &DomSpec) -> String {
    let (open, close) = split_spec(spec);
    open + &close
}

fn split_spec(spec: &DomSpec) -> (String, String) {
    let mut parts = SplitWriter::default();
    write_spec(spec, &mut parts, true);
    (parts.open, parts.close)
}

#[derive(Default)]
struct SplitWriter {
    open: String,
    close: String,
    past_hole: bool,
}

impl SplitWriter {
    fn push(&mut self, text: &str) {
        if self.past_hole {
            self.close.push_str(text);
        } else {
            self.open.push_str(text);
        }
    }
}

fn write_spec(spec: &DomSpec, out: &mut SplitWriter, outermost: bool) {
    match spec {
        DomSpec::Hole => out.past_hole = true,
        DomSpec::Text(text) => out.push(&escape_html(text)),
        DomSpec::Element {
            tag,
            attrs,
            children,
        } => {
            let mut open = format!("<{tag}");
            for (name, value) in attrs {
                open.push_str(&format!(" {name}=\"{}\"", escape_html(value)));
            }
            open.push('>');
            out.push(&open);
            if VOID_TAGS.contains(&tag.as_str()) {
                return;
            }
            for child in children {
                write_spec(child, out, false);
            }
            if outermost {
                out.past_hole = true;
            }
            out.push(&format!("</{tag}>"));
        }
    }
}
