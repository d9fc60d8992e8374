use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApplyError;
use crate::ops::Path;
use crate::schema::Schema;

pub type Attrs = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(kind: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            kind: kind.into(),
            attrs,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }
}

pub fn find_mark<'a>(marks: &'a [Mark], kind: &str) -> Option<&'a Mark> {
    marks.iter().find(|mark| mark.kind == kind)
}

pub fn remove_mark_kind(marks: &[Mark], kind: &str) -> Vec<Mark> {
    marks.iter().filter(|mark| mark.kind != kind).cloned().collect()
}

/// A document node in the JSON shape editors exchange.
///
/// Sizes follow token counting: a text node counts one per character, an
/// atomic leaf counts one, and every other node counts its content plus an
/// opening and a closing token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(skip)]
    pub(crate) leaf: bool,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.attrs == other.attrs
            && self.text == other.text
            && self.marks == other.marks
            && self.content == other.content
    }
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
            leaf: false,
        }
    }

    pub fn leaf(kind: impl Into<String>) -> Self {
        Self {
            leaf: true,
            ..Self::new(kind)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new("text")
        }
    }

    pub fn text_with_marks(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            marks,
            ..Self::text(text)
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        };
        Node::new("paragraph").with_content(content)
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf && self.text.is_none()
    }

    /// Text and atomic leaves both sit inline inside a text block.
    pub fn is_inline_leaf(&self) -> bool {
        self.is_text() || self.is_leaf()
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn node_size(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None if self.leaf => 1,
            None => self.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }

    pub fn has_mark(&self, kind: &str) -> bool {
        find_mark(&self.marks, kind).is_some()
    }

    pub fn text_content(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        let mut out = String::new();
        for child in &self.content {
            out.push_str(&child.text_content());
        }
        out
    }

    /// Calls `f(node, pos, parent, index)` for every node overlapping
    /// `from..to`. Returning false from `f` skips the node's children.
    pub fn nodes_between<'a, F>(&'a self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&'a Node, usize, &'a Node, usize) -> bool,
    {
        walk_between(self, from, to, 0, &mut f);
    }

    pub fn descendants<'a, F>(&'a self, f: F)
    where
        F: FnMut(&'a Node, usize, &'a Node, usize) -> bool,
    {
        self.nodes_between(0, self.content_size(), f);
    }

    /// Text between two positions, with `block_separator` placed between
    /// text blocks and `leaf_text` standing in for atomic leaves.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: &str,
        leaf_text: &str,
    ) -> String {
        let mut out = String::new();
        let mut first = true;
        self.nodes_between(from, to, |node, pos, _, _| {
            if let Some(text) = &node.text {
                out.push_str(&char_slice(
                    text,
                    from.saturating_sub(pos),
                    to.saturating_sub(pos),
                ));
            } else if node.is_leaf() {
                out.push_str(leaf_text);
            } else if node.looks_like_textblock() && !block_separator.is_empty() {
                if first {
                    first = false;
                } else {
                    out.push_str(block_separator);
                }
            }
            true
        });
        out
    }

    pub(crate) fn looks_like_textblock(&self) -> bool {
        !self.is_inline_leaf()
            && self
                .content
                .first()
                .map_or(true, Node::is_inline_leaf)
    }

    /// Index of the child containing `pos` and the offset where it starts.
    /// A position on a boundary resolves to the child after it.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }
        if pos >= self.content_size() {
            return (self.content.len(), self.content_size());
        }
        let mut cur = 0;
        for (index, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return (index + 1, end);
                }
                return (index, cur);
            }
            cur = end;
        }
        (self.content.len(), cur)
    }

    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.find_index(pos);
            let child = node.content.get(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get(index)?;
        }
        Some(node)
    }

    pub fn node_at_path_mut(&mut self, path: &[usize]) -> Result<&mut Node, ApplyError> {
        let mut node = self;
        for (depth, &index) in path.iter().enumerate() {
            let len = node.content.len();
            node = node.content.get_mut(index).ok_or_else(|| {
                ApplyError::path(path, format!("index {index} >= {len} at depth {depth}"))
            })?;
        }
        Ok(node)
    }

    /// Position directly before the node at `path`.
    pub fn pos_of_path(&self, path: &[usize]) -> Option<usize> {
        let mut node = self;
        let mut pos = 0;
        for (depth, &index) in path.iter().enumerate() {
            if index > node.content.len() {
                return None;
            }
            pos += node.content[..index].iter().map(Node::node_size).sum::<usize>();
            if depth + 1 < path.len() {
                node = node.content.get(index)?;
                pos += 1;
            }
        }
        Some(pos)
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, ApplyError> {
        let size = self.content_size();
        if pos > size {
            return Err(ApplyError::PositionOutOfRange { pos, size });
        }
        let mut levels = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = self;
        loop {
            let (index, offset) = node.find_index(parent_offset);
            let rem = parent_offset - offset;
            levels.push(Level {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let Some(child) = node.content.get(index) else {
                break;
            };
            if child.is_inline_leaf() {
                break;
            }
            node = child;
            parent_offset = rem - 1;
            start += offset + 1;
        }
        Ok(ResolvedPos {
            pos,
            levels,
            parent_offset,
        })
    }
}

fn walk_between<'a, F>(parent: &'a Node, from: usize, to: usize, base: usize, f: &mut F)
where
    F: FnMut(&'a Node, usize, &'a Node, usize) -> bool,
{
    let mut pos = 0;
    for (index, child) in parent.content.iter().enumerate() {
        if pos >= to {
            break;
        }
        let end = pos + child.node_size();
        if end > from && f(child, base + pos, parent, index) && !child.content.is_empty() {
            let start = pos + 1;
            walk_between(
                child,
                from.saturating_sub(start),
                child.content_size().min(to.saturating_sub(start)),
                base + start,
                f,
            );
        }
        pos = end;
    }
}

#[derive(Debug, Clone, Copy)]
struct Level<'a> {
    node: &'a Node,
    index: usize,
    offset: usize,
}

#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pub pos: usize,
    levels: Vec<Level<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.levels[depth.min(self.depth())].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    pub fn index(&self, depth: usize) -> usize {
        self.levels[depth.min(self.depth())].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let depth = depth.min(self.depth());
        let bump = if depth == self.depth() && self.text_offset() == 0 {
            0
        } else {
            1
        };
        self.index(depth) + bump
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.levels[depth.min(self.depth()) - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position before the ancestor at `depth`. Depth zero has none.
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            return None;
        }
        if depth == self.depth() + 1 {
            return Some(self.pos);
        }
        self.levels.get(depth - 1).map(|level| level.offset)
    }

    pub fn after(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            return None;
        }
        if depth == self.depth() + 1 {
            return Some(self.pos + self.node_after()?.node_size());
        }
        Some(self.before(depth)? + self.node(depth).node_size())
    }

    pub fn text_offset(&self) -> usize {
        self.pos - self.levels[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<&'a Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        parent.content.get(index)
    }

    pub fn node_before(&self) -> Option<&'a Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if self.text_offset() > 0 {
            return parent.content.get(index);
        }
        index.checked_sub(1).and_then(|ix| parent.content.get(ix))
    }

    pub fn path_to(&self, depth: usize) -> Path {
        self.levels[..depth.min(self.depth())]
            .iter()
            .map(|level| level.index)
            .collect()
    }

    pub fn parent_path(&self) -> Path {
        self.path_to(self.depth())
    }

    pub fn shared_depth(&self, pos: usize) -> usize {
        for depth in (1..=self.depth()).rev() {
            if self.start(depth) <= pos && self.end(depth) >= pos {
                return depth;
            }
        }
        0
    }

    /// Marks a character typed at this position would receive. Marks whose
    /// type is not inclusive stop applying at their end.
    pub fn marks(&self, schema: &Schema) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content.is_empty() {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent
                .content
                .get(index)
                .map(|node| node.marks.clone())
                .unwrap_or_default();
        }
        let before = index.checked_sub(1).and_then(|ix| parent.content.get(ix));
        let after = parent.content.get(index);
        let (main, other) = match before {
            Some(before) => (Some(before), after),
            None => (after, None),
        };
        let Some(main) = main else {
            return Vec::new();
        };
        main.marks
            .iter()
            .filter(|mark| {
                schema.mark_inclusive(&mark.kind)
                    || other.is_some_and(|other| other.marks.contains(mark))
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn map(&self, f: impl Fn(usize) -> usize) -> Self {
        Self::new(f(self.anchor), f(self.head))
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> String {
    if to <= from {
        return String::new();
    }
    text.chars().skip(from).take(to - from).collect()
}

pub(crate) fn split_inline(content: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;
    for node in content {
        let size = node.node_size();
        if pos + size <= offset {
            before.push(node.clone());
        } else if pos >= offset {
            after.push(node.clone());
        } else {
            let text = node.text_str();
            let cut = offset - pos;
            let mut head = node.clone();
            head.text = Some(char_slice(text, 0, cut));
            let mut tail = node.clone();
            tail.text = Some(char_slice(text, cut, size));
            before.push(head);
            after.push(tail);
        }
        pos += size;
    }
    (before, after)
}

pub(crate) fn normalize_inline(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.is_text() && node.text_str().is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.is_text() && node.is_text() && last.marks == node.marks => {
                let mut text = last.text.take().unwrap_or_default();
                text.push_str(node.text_str());
                last.text = Some(text);
            }
            _ => out.push(node),
        }
    }
    out
}

/// Rewrites the marks of inline nodes covering `from..to` (content offsets).
pub(crate) fn map_inline_marks(
    content: &[Node],
    from: usize,
    to: usize,
    f: impl Fn(&[Mark]) -> Vec<Mark>,
) -> Vec<Node> {
    let (head, rest) = split_inline(content, from);
    let (middle, tail) = split_inline(&rest, to.saturating_sub(from));
    let mut out = head;
    for mut node in middle {
        node.marks = f(&node.marks);
        out.push(node);
    }
    out.extend(tail);
    normalize_inline(out)
}
