use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::{Attrs, Mark, Node};
use crate::error::SchemaError;

pub type NodeToDom = Arc<dyn Fn(&Node) -> DomSpec + Send + Sync>;
pub type MarkToDom = Arc<dyn Fn(&Mark) -> DomSpec + Send + Sync>;

/// Output shape of a node or mark. `Hole` marks where content goes.
#[derive(Debug, Clone, PartialEq)]
pub enum DomSpec {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomSpec>,
    },
    Hole,
    Text(String),
}

impl DomSpec {
    pub fn element(tag: impl Into<String>) -> Self {
        DomSpec::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn wrapping(tag: impl Into<String>) -> Self {
        Self::element(tag).child(DomSpec::Hole)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let DomSpec::Element { attrs, .. } = &mut self {
            let name = name.into();
            let value = value.into();
            match attrs.iter_mut().find(|(key, _)| *key == name) {
                Some(entry) => entry.1 = value,
                None => attrs.push((name, value)),
            }
        }
        self
    }

    pub fn push_style(self, declaration: impl Into<String>) -> Self {
        let declaration = declaration.into();
        let style = match self.get_attr("style") {
            Some(existing) if !existing.is_empty() => {
                format!("{}; {declaration}", existing.trim_end_matches(';'))
            }
            _ => declaration,
        };
        self.attr("style", style)
    }

    pub fn child(mut self, child: DomSpec) -> Self {
        if let DomSpec::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            DomSpec::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            DomSpec::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    pub default: Value,
}

impl AttrSpec {
    pub fn new(default: impl Into<Value>) -> Self {
        Self {
            default: default.into(),
        }
    }

    pub fn null() -> Self {
        Self {
            default: Value::Null,
        }
    }
}

#[derive(Clone)]
pub struct NodeSpec {
    pub name: String,
    /// Content expression. Empty means the node is a leaf.
    pub content: String,
    pub group: Option<String>,
    pub inline: bool,
    pub atom: bool,
    pub defining: bool,
    pub isolating: bool,
    pub attrs: Vec<(String, AttrSpec)>,
    pub to_dom: Option<NodeToDom>,
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("content", &self.content)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            group: None,
            inline: false,
            atom: false,
            defining: false,
            isolating: false,
            attrs: Vec::new(),
            to_dom: None,
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn defining(mut self) -> Self {
        self.defining = true;
        self
    }

    pub fn isolating(mut self) -> Self {
        self.isolating = true;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.add_attr(name, spec);
        self
    }

    pub fn to_dom(mut self, f: impl Fn(&Node) -> DomSpec + Send + Sync + 'static) -> Self {
        self.to_dom = Some(Arc::new(f));
        self
    }

    pub fn add_attr(&mut self, name: impl Into<String>, spec: AttrSpec) {
        let name = name.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = spec,
            None => self.attrs.push((name, spec)),
        }
    }

    pub fn wrap_to_dom(&mut self, f: impl Fn(&Node, DomSpec) -> DomSpec + Send + Sync + 'static) {
        let previous = self.to_dom.take();
        let name = self.name.clone();
        self.to_dom = Some(Arc::new(move |node: &Node| {
            let base = match &previous {
                Some(previous) => previous(node),
                None => default_dom(&name),
            };
            f(node, base)
        }));
    }

    pub fn is_leaf(&self) -> bool {
        self.content.trim().is_empty()
    }
}

fn default_dom(name: &str) -> DomSpec {
    match name {
        "text" => DomSpec::Hole,
        _ => DomSpec::wrapping("div"),
    }
}

#[derive(Clone)]
pub struct MarkSpec {
    pub name: String,
    pub attrs: Vec<(String, AttrSpec)>,
    /// Space separated mark names or groups. `None` excludes only itself,
    /// an empty string excludes nothing, `_` excludes every mark.
    pub excludes: Option<String>,
    pub inclusive: bool,
    pub group: Option<String>,
    pub to_dom: Option<MarkToDom>,
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("excludes", &self.excludes)
            .field("inclusive", &self.inclusive)
            .finish_non_exhaustive()
    }
}

impl MarkSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            excludes: None,
            inclusive: true,
            group: None,
            to_dom: None,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.add_attr(name, spec);
        self
    }

    pub fn excludes(mut self, excludes: impl Into<String>) -> Self {
        self.excludes = Some(excludes.into());
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    pub fn to_dom(mut self, f: impl Fn(&Mark) -> DomSpec + Send + Sync + 'static) -> Self {
        self.to_dom = Some(Arc::new(f));
        self
    }

    pub fn add_attr(&mut self, name: impl Into<String>, spec: AttrSpec) {
        let name = name.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = spec,
            None => self.attrs.push((name, spec)),
        }
    }

    pub fn wrap_to_dom(&mut self, f: impl Fn(&Mark, DomSpec) -> DomSpec + Send + Sync + 'static) {
        let previous = self.to_dom.take();
        self.to_dom = Some(Arc::new(move |mark: &Mark| {
            let base = match &previous {
                Some(previous) => previous(mark),
                None => DomSpec::wrapping("span"),
            };
            f(mark, base)
        }));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Name(String),
    Choice(Vec<Expr>),
    Seq(Vec<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    Opt(Box<Expr>),
}

struct ExprParser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn parse(source: &'a str) -> Result<Option<Expr>, String> {
        let tokens = tokenize(source);
        if tokens.is_empty() {
            return Ok(None);
        }
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.choice()?;
        if parser.pos < parser.tokens.len() {
            return Err(format!("unexpected token `{}`", parser.tokens[parser.pos]));
        }
        Ok(Some(expr))
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn choice(&mut self) -> Result<Expr, String> {
        let mut options = vec![self.seq()?];
        while self.peek() == Some("|") {
            self.pos += 1;
            options.push(self.seq()?);
        }
        Ok(if options.len() == 1 {
            options.remove(0)
        } else {
            Expr::Choice(options)
        })
    }

    fn seq(&mut self) -> Result<Expr, String> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if token == "|" || token == ")" {
                break;
            }
            items.push(self.term()?);
        }
        match items.len() {
            0 => Err("empty expression".to_string()),
            1 => Ok(items.remove(0)),
            _ => Ok(Expr::Seq(items)),
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut expr = self.atom()?;
        loop {
            expr = match self.peek() {
                Some("*") => Expr::Star(Box::new(expr)),
                Some("+") => Expr::Plus(Box::new(expr)),
                Some("?") => Expr::Opt(Box::new(expr)),
                _ => return Ok(expr),
            };
            self.pos += 1;
        }
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some("(") => {
                self.pos += 1;
                let expr = self.choice()?;
                if self.peek() != Some(")") {
                    return Err("missing closing parenthesis".to_string());
                }
                self.pos += 1;
                Ok(expr)
            }
            Some(token) if token.chars().all(|c| c.is_alphanumeric() || c == '_') => {
                self.pos += 1;
                Ok(Expr::Name(token.to_string()))
            }
            Some(token) => Err(format!("unexpected token `{token}`")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn tokenize(source: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (ix, c) in source.char_indices() {
        let word = c.is_alphanumeric() || c == '_';
        if word {
            if start.is_none() {
                start = Some(ix);
            }
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(&source[s..ix]);
        }
        if !c.is_whitespace() {
            tokens.push(&source[ix..ix + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&source[s..]);
    }
    tokens
}

impl Expr {
    fn names(&self, out: &mut Vec<String>) {
        match self {
            Expr::Name(name) => out.push(name.clone()),
            Expr::Choice(items) | Expr::Seq(items) => {
                for item in items {
                    item.names(out);
                }
            }
            Expr::Star(inner) | Expr::Plus(inner) | Expr::Opt(inner) => inner.names(out),
        }
    }

    fn ends(&self, kinds: &[&str], start: usize, matches: &dyn Fn(&str, &str) -> bool) -> BTreeSet<usize> {
        match self {
            Expr::Name(name) => {
                let mut out = BTreeSet::new();
                if kinds.get(start).is_some_and(|kind| matches(kind, name)) {
                    out.insert(start + 1);
                }
                out
            }
            Expr::Choice(items) => items
                .iter()
                .flat_map(|item| item.ends(kinds, start, matches))
                .collect(),
            Expr::Seq(items) => {
                let mut current = BTreeSet::from([start]);
                for item in items {
                    current = current
                        .iter()
                        .flat_map(|&pos| item.ends(kinds, pos, matches))
                        .collect();
                    if current.is_empty() {
                        break;
                    }
                }
                current
            }
            Expr::Opt(inner) => {
                let mut out = inner.ends(kinds, start, matches);
                out.insert(start);
                out
            }
            Expr::Star(inner) => repeat_ends(inner, kinds, BTreeSet::from([start]), matches),
            Expr::Plus(inner) => {
                let first = inner.ends(kinds, start, matches);
                repeat_ends(inner, kinds, first, matches)
            }
        }
    }
}

fn repeat_ends(
    inner: &Expr,
    kinds: &[&str],
    seed: BTreeSet<usize>,
    matches: &dyn Fn(&str, &str) -> bool,
) -> BTreeSet<usize> {
    let mut seen = seed.clone();
    let mut frontier: Vec<usize> = seed.into_iter().collect();
    while let Some(pos) = frontier.pop() {
        for next in inner.ends(kinds, pos, matches) {
            if next > pos && seen.insert(next) {
                frontier.push(next);
            }
        }
    }
    seen
}

#[derive(Debug, Clone)]
struct NodeType {
    spec: NodeSpec,
    expr: Option<Expr>,
    groups: Vec<String>,
    inline_content: bool,
}

#[derive(Debug, Clone)]
struct MarkType {
    spec: MarkSpec,
    rank: usize,
    excluded: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<NodeType>,
    node_index: HashMap<String, usize>,
    marks: Vec<MarkType>,
    mark_index: HashMap<String, usize>,
    top_node: String,
}

impl Schema {
    pub fn new(mut node_specs: Vec<NodeSpec>, mark_specs: Vec<MarkSpec>) -> Result<Self, SchemaError> {
        if !node_specs.iter().any(|spec| spec.name == "text") {
            node_specs.push(NodeSpec::new("text").group("inline").inline());
        }
        if !node_specs.iter().any(|spec| spec.name == "doc") {
            return Err(SchemaError::MissingTopNode("doc".to_string()));
        }

        let mut nodes = Vec::with_capacity(node_specs.len());
        let mut node_index = HashMap::new();
        for spec in node_specs {
            let expr = ExprParser::parse(&spec.content).map_err(|reason| {
                SchemaError::InvalidContentExpr {
                    node: spec.name.clone(),
                    expr: spec.content.clone(),
                    reason,
                }
            })?;
            let groups = spec
                .group
                .as_deref()
                .map(|group| group.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            node_index.insert(spec.name.clone(), nodes.len());
            nodes.push(NodeType {
                spec,
                expr,
                groups,
                inline_content: false,
            });
        }

        let mut marks = Vec::with_capacity(mark_specs.len());
        let mut mark_index = HashMap::new();
        for (rank, spec) in mark_specs.into_iter().enumerate() {
            mark_index.insert(spec.name.clone(), rank);
            marks.push(MarkType {
                spec,
                rank,
                excluded: Vec::new(),
            });
        }

        let mut schema = Schema {
            nodes,
            node_index,
            marks,
            mark_index,
            top_node: "doc".to_string(),
        };

        for ix in 0..schema.nodes.len() {
            let Some(expr) = schema.nodes[ix].expr.clone() else {
                continue;
            };
            let mut names = Vec::new();
            expr.names(&mut names);
            let mut resolved = Vec::new();
            for name in &names {
                let kinds = schema.kinds_matching(name);
                if kinds.is_empty() {
                    return Err(SchemaError::InvalidContentExpr {
                        node: schema.nodes[ix].spec.name.clone(),
                        expr: schema.nodes[ix].spec.content.clone(),
                        reason: format!("no node type or group named `{name}`"),
                    });
                }
                resolved.extend(kinds);
            }
            schema.nodes[ix].inline_content = resolved.iter().all(|kind| schema.is_inline(kind));
        }

        let all_marks: Vec<String> = schema.marks.iter().map(|m| m.spec.name.clone()).collect();
        for mark in &mut schema.marks {
            mark.excluded = match mark.spec.excludes.as_deref() {
                None => vec![mark.spec.name.clone()],
                Some("_") => all_marks.clone(),
                Some(list) => list.split_whitespace().map(str::to_string).collect(),
            };
        }
        let groups: Vec<(String, Option<String>)> = schema
            .marks
            .iter()
            .map(|m| (m.spec.name.clone(), m.spec.group.clone()))
            .collect();
        for mark in &mut schema.marks {
            let mut expanded = Vec::new();
            for name in &mark.excluded {
                let in_group = groups.iter().filter(|(_, group)| {
                    group
                        .as_deref()
                        .is_some_and(|g| g.split_whitespace().any(|g| g == name))
                });
                let mut hit = false;
                for (member, _) in in_group {
                    expanded.push(member.clone());
                    hit = true;
                }
                if !hit {
                    expanded.push(name.clone());
                }
            }
            mark.excluded = expanded;
        }

        Ok(schema)
    }

    pub fn top_node(&self) -> &str {
        &self.top_node
    }

    pub fn node_spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_index.get(kind).map(|&ix| &self.nodes[ix].spec)
    }

    pub fn mark_spec(&self, kind: &str) -> Option<&MarkSpec> {
        self.mark_index.get(kind).map(|&ix| &self.marks[ix].spec)
    }

    pub fn has_node(&self, kind: &str) -> bool {
        self.node_index.contains_key(kind)
    }

    pub fn has_mark(&self, kind: &str) -> bool {
        self.mark_index.contains_key(kind)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.spec.name.as_str())
    }

    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().map(|mark| mark.spec.name.as_str())
    }

    pub fn is_inline(&self, kind: &str) -> bool {
        self.node_spec(kind).is_some_and(|spec| spec.inline)
    }

    pub fn is_block(&self, kind: &str) -> bool {
        self.node_spec(kind).is_some_and(|spec| !spec.inline)
    }

    pub fn is_textblock(&self, kind: &str) -> bool {
        self.node_index.get(kind).is_some_and(|&ix| {
            let node = &self.nodes[ix];
            !node.spec.inline && node.expr.is_some() && node.inline_content
        })
    }

    pub fn in_group(&self, kind: &str, group: &str) -> bool {
        self.node_index
            .get(kind)
            .is_some_and(|&ix| self.nodes[ix].groups.iter().any(|g| g == group))
    }

    pub fn mark_inclusive(&self, kind: &str) -> bool {
        self.mark_spec(kind).is_none_or(|spec| spec.inclusive)
    }

    fn kinds_matching(&self, name: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.spec.name == name || node.groups.iter().any(|g| g == name))
            .map(|node| node.spec.name.clone())
            .collect()
    }

    fn matches_name(&self, kind: &str, name: &str) -> bool {
        kind == name || self.in_group(kind, name)
    }

    pub fn valid_content(&self, kind: &str, content: &[Node]) -> bool {
        let Some(&ix) = self.node_index.get(kind) else {
            return false;
        };
        let kinds: Vec<&str> = content.iter().map(|node| node.kind.as_str()).collect();
        match &self.nodes[ix].expr {
            None => kinds.is_empty(),
            Some(expr) => expr
                .ends(&kinds, 0, &|kind, name| self.matches_name(kind, name))
                .contains(&kinds.len()),
        }
    }

    pub fn default_block_kind(&self, kind: &str) -> Option<&str> {
        let ix = *self.node_index.get(kind)?;
        let expr = self.nodes[ix].expr.as_ref()?;
        let mut names = Vec::new();
        expr.names(&mut names);
        names.iter().find_map(|name| {
            self.nodes
                .iter()
                .find(|node| {
                    (node.spec.name == *name || node.groups.iter().any(|g| g == name))
                        && node.spec.name != "text"
                })
                .map(|node| node.spec.name.as_str())
        })
    }

    pub fn default_attrs(&self, kind: &str) -> Attrs {
        self.node_spec(kind)
            .map(|spec| {
                spec.attrs
                    .iter()
                    .map(|(name, attr)| (name.clone(), attr.default.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn compute_attrs(declared: &[(String, AttrSpec)], given: &Attrs) -> Attrs {
        declared
            .iter()
            .map(|(name, spec)| {
                let value = given.get(name).cloned().unwrap_or_else(|| spec.default.clone());
                (name.clone(), value)
            })
            .collect()
    }

    pub fn node(
        &self,
        kind: &str,
        attrs: Option<&Attrs>,
        content: Vec<Node>,
    ) -> Result<Node, SchemaError> {
        let spec = self
            .node_spec(kind)
            .ok_or_else(|| SchemaError::UnknownNodeType(kind.to_string()))?;
        let empty = Attrs::new();
        let mut node = Node::new(kind)
            .with_attrs(Self::compute_attrs(&spec.attrs, attrs.unwrap_or(&empty)))
            .with_content(content);
        node.leaf = spec.is_leaf() && kind != "text";
        Ok(node)
    }

    pub fn mark(&self, kind: &str, attrs: Option<&Attrs>) -> Result<Mark, SchemaError> {
        let spec = self
            .mark_spec(kind)
            .ok_or_else(|| SchemaError::UnknownMarkType(kind.to_string()))?;
        let empty = Attrs::new();
        Ok(Mark::with_attrs(
            kind,
            Self::compute_attrs(&spec.attrs, attrs.unwrap_or(&empty)),
        ))
    }

    pub fn create_and_fill(&self, kind: &str, attrs: Option<&Attrs>) -> Result<Node, SchemaError> {
        let ix = *self
            .node_index
            .get(kind)
            .ok_or_else(|| SchemaError::UnknownNodeType(kind.to_string()))?;
        let mut content = Vec::new();
        if let Some(expr) = &self.nodes[ix].expr {
            for child in self.minimal_kinds(expr) {
                content.push(self.create_and_fill(&child, None)?);
            }
        }
        self.node(kind, attrs, content)
    }

    fn minimal_kinds(&self, expr: &Expr) -> Vec<String> {
        match expr {
            Expr::Name(name) => self
                .kinds_matching(name)
                .into_iter()
                .find(|kind| kind != "text")
                .into_iter()
                .collect(),
            Expr::Choice(items) => items
                .first()
                .map(|item| self.minimal_kinds(item))
                .unwrap_or_default(),
            Expr::Seq(items) => items.iter().flat_map(|item| self.minimal_kinds(item)).collect(),
            Expr::Star(_) | Expr::Opt(_) => Vec::new(),
            Expr::Plus(inner) => self.minimal_kinds(inner),
        }
    }

    /// Reads a node tree from JSON, filling attribute defaults and dropping
    /// attributes the type does not declare.
    pub fn node_from_json(&self, value: &Value) -> Result<Node, SchemaError> {
        let raw: Node = serde_json::from_value(value.clone())
            .map_err(|_| SchemaError::InvalidContent("<json>".to_string()))?;
        let node = self.adopt(raw)?;
        self.check(&node)?;
        Ok(node)
    }

    pub fn adopt(&self, raw: Node) -> Result<Node, SchemaError> {
        let spec = self
            .node_spec(&raw.kind)
            .ok_or_else(|| SchemaError::UnknownNodeType(raw.kind.clone()))?;
        let mut marks = Vec::with_capacity(raw.marks.len());
        for mark in &raw.marks {
            marks.push(self.mark(&mark.kind, Some(&mark.attrs))?);
        }
        if raw.kind == "text" {
            let text = raw.text.unwrap_or_default();
            if text.is_empty() {
                return Err(SchemaError::EmptyText);
            }
            return Ok(Node::text_with_marks(text, marks));
        }
        let attrs = Self::compute_attrs(&spec.attrs, &raw.attrs);
        let leaf = spec.is_leaf();
        let mut content = Vec::with_capacity(raw.content.len());
        for child in raw.content {
            content.push(self.adopt(child)?);
        }
        let mut node = Node::new(raw.kind)
            .with_attrs(attrs)
            .with_content(content)
            .with_marks(marks);
        node.leaf = leaf;
        Ok(node)
    }

    pub fn check(&self, node: &Node) -> Result<(), SchemaError> {
        if node.is_text() {
            if node.text_str().is_empty() {
                return Err(SchemaError::EmptyText);
            }
            return Ok(());
        }
        if !self.valid_content(&node.kind, &node.content) {
            return Err(SchemaError::InvalidContent(node.kind.clone()));
        }
        for child in &node.content {
            self.check(child)?;
        }
        Ok(())
    }

    pub fn excludes(&self, a: &str, b: &str) -> bool {
        self.mark_index
            .get(a)
            .is_some_and(|&ix| self.marks[ix].excluded.iter().any(|name| name == b))
    }

    fn rank(&self, kind: &str) -> usize {
        self.mark_index.get(kind).map_or(usize::MAX, |&ix| self.marks[ix].rank)
    }

    /// Adds `mark` to an ordered mark set. Marks it excludes are dropped and
    /// a mark excluded by an existing one is not added.
    pub fn add_mark_to_set(&self, set: &[Mark], mark: &Mark) -> Vec<Mark> {
        let mut copy: Option<Vec<Mark>> = None;
        let mut placed = false;
        for (ix, other) in set.iter().enumerate() {
            if other == mark {
                return set.to_vec();
            }
            if self.excludes(&mark.kind, &other.kind) {
                if copy.is_none() {
                    copy = Some(set[..ix].to_vec());
                }
            } else if self.excludes(&other.kind, &mark.kind) {
                return set.to_vec();
            } else {
                if !placed && self.rank(&other.kind) > self.rank(&mark.kind) {
                    let out = copy.get_or_insert_with(|| set[..ix].to_vec());
                    out.push(mark.clone());
                    placed = true;
                }
                if let Some(out) = copy.as_mut() {
                    out.push(other.clone());
                }
            }
        }
        let mut out = copy.unwrap_or_else(|| set.to_vec());
        if !placed {
            out.push(mark.clone());
        }
        out
    }
}
