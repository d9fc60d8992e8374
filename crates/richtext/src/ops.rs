use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    Attrs, Mark, Node, Selection, char_len, char_slice, map_inline_marks, normalize_inline,
    remove_mark_kind, split_inline,
};
use crate::error::{ApplyError, SchemaError};
use crate::schema::Schema;

pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    SetNodeAttrs {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
    },
    SetNodeKind {
        #[serde(default)]
        path: Path,
        kind: String,
    },
    SetMarks {
        #[serde(default)]
        path: Path,
        marks: Vec<Mark>,
    },
    /// Swaps the whole child list of the node at `path`. An empty path is
    /// the document itself.
    ReplaceChildren {
        #[serde(default)]
        path: Path,
        content: Vec<Node>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut set = Attrs::new();
        set.insert(name.into(), value.into());
        Self {
            set,
            remove: Vec::new(),
        }
    }

    pub fn diff(from: &Attrs, to: &Attrs) -> Self {
        let set = to
            .iter()
            .filter(|(key, value)| from.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let remove = from
            .keys()
            .filter(|key| !to.contains_key(*key))
            .cloned()
            .collect();
        Self { set, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) -> AttrPatch {
    let mut old_set = Attrs::new();
    let mut old_remove = Vec::new();

    for (key, value) in &patch.set {
        if let Some(prev) = attrs.insert(key.clone(), value.clone()) {
            old_set.insert(key.clone(), prev);
        } else {
            old_remove.push(key.clone());
        }
    }

    for key in &patch.remove {
        if let Some(prev) = attrs.remove(key) {
            old_set.insert(key.clone(), prev);
        }
    }

    AttrPatch {
        set: old_set,
        remove: old_remove,
    }
}

fn split_parent(path: &[usize]) -> Result<(&[usize], usize), ApplyError> {
    match path.split_last() {
        Some((&index, parent)) => Ok((parent, index)),
        None => Err(ApplyError::path(path, "empty path")),
    }
}

fn text_node_mut<'a>(doc: &'a mut Node, path: &[usize]) -> Result<&'a mut String, ApplyError> {
    doc.node_at_path_mut(path)?
        .text
        .as_mut()
        .ok_or_else(|| ApplyError::path(path, "expected a text node"))
}

/// Applies one op and returns the op that undoes it.
pub fn apply_op_to(doc: &mut Node, op: Op) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let current = text_node_mut(doc, &path)?;
            let offset = offset.min(char_len(current));
            let len = char_len(&text);
            let mut next = char_slice(current, 0, offset);
            next.push_str(&text);
            next.push_str(&char_slice(current, offset, usize::MAX));
            *current = next;
            Ok(Op::RemoveText {
                path,
                range: offset..offset + len,
            })
        }
        Op::RemoveText { path, range } => {
            let current = text_node_mut(doc, &path)?;
            let len = char_len(current);
            let start = range.start.min(len);
            let end = range.end.min(len);
            let removed = char_slice(current, start, end);
            let mut next = char_slice(current, 0, start);
            next.push_str(&char_slice(current, end, len));
            *current = next;
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            let (parent, index) = split_parent(&path)?;
            let children = &mut doc.node_at_path_mut(parent)?.content;
            if index > children.len() {
                return Err(ApplyError::path(
                    &path,
                    format!("insert index {index} > {}", children.len()),
                ));
            }
            children.insert(index, node);
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let (parent, index) = split_parent(&path)?;
            let children = &mut doc.node_at_path_mut(parent)?.content;
            if index >= children.len() {
                return Err(ApplyError::path(
                    &path,
                    format!("remove index {index} >= {}", children.len()),
                ));
            }
            let node = children.remove(index);
            Ok(Op::InsertNode { path, node })
        }
        Op::SetNodeAttrs { path, patch } => {
            let node = doc.node_at_path_mut(&path)?;
            if node.is_text() {
                return Err(ApplyError::path(&path, "text has no attrs"));
            }
            let old = patch_apply(&mut node.attrs, &patch);
            Ok(Op::SetNodeAttrs { path, patch: old })
        }
        Op::SetNodeKind { path, kind } => {
            let node = doc.node_at_path_mut(&path)?;
            if node.is_text() {
                return Err(ApplyError::path(&path, "text kind is fixed"));
            }
            let old = std::mem::replace(&mut node.kind, kind);
            Ok(Op::SetNodeKind { path, kind: old })
        }
        Op::SetMarks { path, marks } => {
            let node = doc.node_at_path_mut(&path)?;
            let old = std::mem::replace(&mut node.marks, marks);
            Ok(Op::SetMarks { path, marks: old })
        }
        Op::ReplaceChildren { path, content } => {
            let node = doc.node_at_path_mut(&path)?;
            if node.is_inline_leaf() {
                return Err(ApplyError::path(&path, "leaf nodes have no children"));
            }
            let old = std::mem::replace(&mut node.content, content);
            Ok(Op::ReplaceChildren { path, content: old })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepMap {
    Identity,
    /// `old` tokens at `start` became `new` tokens.
    Replace { start: usize, old: usize, new: usize },
    /// A replaced region where positions inside text blocks follow their
    /// block by ordinal and keep their offset inside it.
    Anchored {
        start: usize,
        old: usize,
        new: usize,
        old_blocks: Vec<(usize, usize)>,
        new_blocks: Vec<(usize, usize)>,
    },
}

impl StepMap {
    /// Maps a position. Insertions at exactly `pos` push it forward.
    pub fn map(&self, pos: usize) -> usize {
        match self {
            StepMap::Identity => pos,
            StepMap::Replace { start, old, new } => {
                let end = start + old;
                if pos < *start {
                    pos
                } else if pos > end {
                    pos - old + new
                } else if *old == 0 || pos == end {
                    start + new
                } else if pos == *start {
                    *start
                } else {
                    start + new
                }
            }
            StepMap::Anchored {
                start,
                old,
                new,
                old_blocks,
                new_blocks,
            } => {
                let end = start + old;
                if pos < *start {
                    return pos;
                }
                if pos > end {
                    return pos - old + new;
                }
                if let Some(ix) = old_blocks.iter().position(|(s, e)| pos >= *s && pos <= *e) {
                    if let Some((ns, ne)) = new_blocks.get(ix) {
                        return ns + (pos - old_blocks[ix].0).min(ne - ns);
                    }
                }
                if let Some(ix) = old_blocks.iter().position(|(s, _)| *s > pos) {
                    if let Some((ns, _)) = new_blocks.get(ix) {
                        return *ns;
                    }
                }
                if pos == *start {
                    *start
                } else {
                    start + new
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub op: Op,
    pub inverse: Op,
    pub map: StepMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub prevent_update: bool,
    #[serde(default)]
    pub focus: bool,
    #[serde(default)]
    pub blur: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Arc<Schema>,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    selection: Selection,
    selection_set: bool,
    stored_marks: Option<Vec<Mark>>,
    stored_marks_set: bool,
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(
        schema: Arc<Schema>,
        doc: Node,
        selection: Selection,
        stored_marks: Option<Vec<Mark>>,
    ) -> Self {
        Self {
            schema,
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            selection,
            selection_set: false,
            stored_marks,
            stored_marks_set: false,
            meta: TransactionMeta::default(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_arc(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn before(&self) -> &Node {
        &self.before
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    pub fn stored_marks_set(&self) -> bool {
        self.stored_marks_set
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn ops(&self) -> impl Iterator<Item = &Op> {
        self.steps.iter().map(|step| &step.op)
    }

    /// Ops that undo this transaction, in application order.
    pub fn inverse_ops(&self) -> Vec<Op> {
        self.steps.iter().rev().map(|step| step.inverse.clone()).collect()
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        let size = self.doc.content_size();
        self.selection = Selection::new(selection.anchor.min(size), selection.head.min(size));
        self.selection_set = true;
        self
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_set = true;
        self
    }

    pub fn add_stored_mark(&mut self, mark: Mark) -> &mut Self {
        let current = self.current_marks();
        let next = self.schema.add_mark_to_set(&current, &mark);
        self.set_stored_marks(Some(next))
    }

    pub fn remove_stored_mark(&mut self, kind: &str) -> &mut Self {
        let current = self.current_marks();
        self.set_stored_marks(Some(remove_mark_kind(&current, kind)))
    }

    pub fn current_marks(&self) -> Vec<Mark> {
        match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => self
                .doc
                .resolve(self.selection.head)
                .map(|pos| pos.marks(&self.schema))
                .unwrap_or_default(),
        }
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.meta.extra.insert(key.into(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.extra.get(key)
    }

    pub fn set_prevent_update(&mut self, prevent: bool) -> &mut Self {
        self.meta.prevent_update = prevent;
        self
    }

    pub fn step(&mut self, op: Op) -> Result<&mut Self, ApplyError> {
        self.step_with_map(op, None)
    }

    /// Applies `op`, moving the selection through `map` or the op's
    /// default mapping.
    pub fn step_with_map(&mut self, op: Op, map: Option<StepMap>) -> Result<&mut Self, ApplyError> {
        let map = match map {
            Some(map) => map,
            None => self.default_map(&op)?,
        };
        let inverse = apply_op_to(&mut self.doc, op.clone())?;
        let size = self.doc.content_size();
        self.selection = self.selection.map(|pos| map.map(pos).min(size));
        if !self.stored_marks_set {
            self.stored_marks = None;
        }
        self.steps.push(Step { op, inverse, map });
        Ok(self)
    }

    pub fn map_since(&self, from_step: usize, pos: usize) -> usize {
        self.steps
            .iter()
            .skip(from_step)
            .fold(pos, |pos, step| step.map.map(pos))
    }

    pub fn map(&self, pos: usize) -> usize {
        self.map_since(0, pos)
    }

    fn default_map(&self, op: &Op) -> Result<StepMap, ApplyError> {
        let pos_of = |path: &[usize]| {
            self.doc
                .pos_of_path(path)
                .ok_or_else(|| ApplyError::path(path, "no such node"))
        };
        Ok(match op {
            Op::InsertText { path, offset, text } => StepMap::Replace {
                start: pos_of(path)? + offset,
                old: 0,
                new: char_len(text),
            },
            Op::RemoveText { path, range } => StepMap::Replace {
                start: pos_of(path)? + range.start,
                old: range.end.saturating_sub(range.start),
                new: 0,
            },
            Op::InsertNode { path, node } => StepMap::Replace {
                start: pos_of(path)?,
                old: 0,
                new: node.node_size(),
            },
            Op::RemoveNode { path } => {
                let node = self
                    .doc
                    .node_at_path(path)
                    .ok_or_else(|| ApplyError::path(path, "no such node"))?;
                StepMap::Replace {
                    start: pos_of(path)?,
                    old: node.node_size(),
                    new: 0,
                }
            }
            Op::SetNodeAttrs { .. } | Op::SetNodeKind { .. } | Op::SetMarks { .. } => {
                StepMap::Identity
            }
            Op::ReplaceChildren { path, content } => {
                let node = self
                    .doc
                    .node_at_path(path)
                    .ok_or_else(|| ApplyError::path(path, "no such node"))?;
                let start = if path.is_empty() { 0 } else { pos_of(path)? + 1 };
                let old = node.content_size();
                let new = content.iter().map(Node::node_size).sum();
                let (old_blocks, new_blocks) = if self.schema.is_textblock(&node.kind) {
                    (vec![(start, start + old)], vec![(start, start + new)])
                } else {
                    let mut old_blocks = Vec::new();
                    let mut new_blocks = Vec::new();
                    self.collect_textblocks(&node.content, start, &mut old_blocks);
                    self.collect_textblocks(content, start, &mut new_blocks);
                    (old_blocks, new_blocks)
                };
                StepMap::Anchored {
                    start,
                    old,
                    new,
                    old_blocks,
                    new_blocks,
                }
            }
        })
    }

    fn collect_textblocks(&self, nodes: &[Node], base: usize, out: &mut Vec<(usize, usize)>) {
        let mut pos = base;
        for node in nodes {
            if self.schema.is_textblock(&node.kind) {
                out.push((pos + 1, pos + 1 + node.content_size()));
            } else if !node.is_inline_leaf() {
                self.collect_textblocks(&node.content, pos + 1, out);
            }
            pos += node.node_size();
        }
    }

    pub fn textblocks_between(&self, from: usize, to: usize) -> Vec<(Path, usize)> {
        textblocks_between(&self.doc, &self.schema, from, to)
    }

    pub fn path_at(&self, pos: usize) -> Result<Path, ApplyError> {
        node_path_at(&self.doc, pos)
    }

    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, ApplyError> {
        let path = self.path_at(pos)?;
        let current = self
            .doc
            .node_at_path(&path)
            .map(|node| node.attrs.clone())
            .unwrap_or_default();
        let patch = AttrPatch::diff(&current, &attrs);
        if patch.is_empty() {
            return Ok(self);
        }
        self.step(Op::SetNodeAttrs { path, patch })
    }

    pub fn set_node_attribute(
        &mut self,
        pos: usize,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ApplyError> {
        let path = self.path_at(pos)?;
        let value = value.into();
        let unchanged = self
            .doc
            .node_at_path(&path)
            .is_some_and(|node| node.attrs.get(name) == Some(&value));
        if unchanged {
            return Ok(self);
        }
        self.step(Op::SetNodeAttrs {
            path,
            patch: AttrPatch::set(name, value),
        })
    }

    /// Changes the type of the node at `pos`. Attributes are rebuilt from
    /// the new type's defaults overlaid with `attrs`.
    pub fn set_node_markup(
        &mut self,
        pos: usize,
        kind: &str,
        attrs: Option<&Attrs>,
    ) -> Result<&mut Self, ApplyError> {
        let path = self.path_at(pos)?;
        let built = self.schema.node(kind, attrs, Vec::new())?;
        let current_kind = self
            .doc
            .node_at_path(&path)
            .map(|node| node.kind.clone())
            .unwrap_or_default();
        if current_kind != kind {
            self.step(Op::SetNodeKind {
                path: path.clone(),
                kind: kind.to_string(),
            })?;
        }
        self.set_node_attrs(pos, built.attrs)
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, ApplyError> {
        let schema = self.schema.clone();
        self.rewrite_marks(from, to, |marks| schema.add_mark_to_set(marks, &mark))
    }

    pub fn remove_mark(
        &mut self,
        from: usize,
        to: usize,
        kind: Option<&str>,
    ) -> Result<&mut Self, ApplyError> {
        self.rewrite_marks(from, to, |marks| match kind {
            Some(kind) => remove_mark_kind(marks, kind),
            None => Vec::new(),
        })
    }

    fn rewrite_marks(
        &mut self,
        from: usize,
        to: usize,
        f: impl Fn(&[Mark]) -> Vec<Mark>,
    ) -> Result<&mut Self, ApplyError> {
        for (path, pos) in self.textblocks_between(from, to) {
            let Some(block) = self.doc.node_at_path(&path) else {
                continue;
            };
            let start = pos + 1;
            let end = start + block.content_size();
            let lo = from.max(start) - start;
            let hi = to.min(end).saturating_sub(start);
            if lo >= hi {
                continue;
            }
            let content = map_inline_marks(&block.content, lo, hi, &f);
            if content != block.content {
                self.step_with_map(Op::ReplaceChildren { path, content }, Some(StepMap::Identity))?;
            }
        }
        Ok(self)
    }

    /// Replaces `from..to` with `text`, using the stored marks or the marks
    /// at `from`.
    pub fn insert_text(&mut self, text: &str, from: usize, to: usize) -> Result<&mut Self, ApplyError> {
        if text.is_empty() {
            return self.delete(from, to);
        }
        let marks = match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => {
                let resolved = self.doc.resolve(from)?;
                match resolved.node_after() {
                    Some(after) if from != to && after.is_inline_leaf() => after.marks.clone(),
                    _ => resolved.marks(&self.schema),
                }
            }
        };
        self.delete(from, to)?;
        self.insert_text_with_marks(text, from, marks)
    }

    fn insert_text_with_marks(
        &mut self,
        text: &str,
        pos: usize,
        marks: Vec<Mark>,
    ) -> Result<&mut Self, ApplyError> {
        let (path, offset, index, text_offset) = {
            let resolved = self.doc.resolve(pos)?;
            if !self.schema.is_textblock(&resolved.parent().kind) {
                return Err(ApplyError::NotInTextblock(pos));
            }
            (
                resolved.parent_path(),
                resolved.parent_offset(),
                resolved.index(resolved.depth()),
                resolved.text_offset(),
            )
        };
        let Some(parent) = self.doc.node_at_path(&path) else {
            return Err(ApplyError::path(&path, "no such node"));
        };

        let same = |node: Option<&Node>| node.is_some_and(|n| n.is_text() && n.marks == marks);
        let target = if text_offset > 0 && same(parent.child(index)) {
            Some((index, text_offset))
        } else if text_offset == 0 && index > 0 && same(parent.child(index - 1)) {
            let prev = parent.child(index - 1).map_or(0, Node::node_size);
            Some((index - 1, prev))
        } else if text_offset == 0 && same(parent.child(index)) {
            Some((index, 0))
        } else {
            None
        };

        if let Some((child, at)) = target {
            let mut text_path = path;
            text_path.push(child);
            return self.step(Op::InsertText {
                path: text_path,
                offset: at,
                text: text.to_string(),
            });
        }

        let (mut content, after) = split_inline(&parent.content, offset);
        content.push(Node::text_with_marks(text, marks));
        content.extend(after);
        let map = StepMap::Replace {
            start: pos,
            old: 0,
            new: char_len(text),
        };
        self.step_with_map(
            Op::ReplaceChildren {
                path,
                content: normalize_inline(content),
            },
            Some(map),
        )
    }

    pub fn insert_inline(&mut self, pos: usize, node: Node) -> Result<&mut Self, ApplyError> {
        let (path, offset, marks) = {
            let resolved = self.doc.resolve(pos)?;
            if !self.schema.is_textblock(&resolved.parent().kind) {
                return Err(ApplyError::NotInTextblock(pos));
            }
            (
                resolved.parent_path(),
                resolved.parent_offset(),
                resolved.marks(&self.schema),
            )
        };
        let Some(parent) = self.doc.node_at_path(&path) else {
            return Err(ApplyError::path(&path, "no such node"));
        };
        let size = node.node_size();
        let (mut content, after) = split_inline(&parent.content, offset);
        content.push(node.with_marks(marks));
        content.extend(after);
        let map = StepMap::Replace {
            start: pos,
            old: 0,
            new: size,
        };
        self.step_with_map(
            Op::ReplaceChildren {
                path,
                content: normalize_inline(content),
            },
            Some(map),
        )
    }

    /// Deletes `from..to`. When the ends sit in different text blocks the
    /// blocks are joined and emptied containers are dropped.
    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, ApplyError> {
        if from >= to {
            return Ok(self);
        }
        let (from_path, to_path, from_tb, to_tb, lo, hi) = {
            let start = self.doc.resolve(from)?;
            let end = self.doc.resolve(to)?;
            (
                start.parent_path(),
                end.parent_path(),
                self.schema.is_textblock(&start.parent().kind),
                self.schema.is_textblock(&end.parent().kind),
                start.parent_offset(),
                end.parent_offset(),
            )
        };

        if from_path == to_path && from_tb {
            let Some(parent) = self.doc.node_at_path(&from_path) else {
                return Err(ApplyError::path(&from_path, "no such node"));
            };
            let (mut content, rest) = split_inline(&parent.content, lo);
            let (_, tail) = split_inline(&rest, hi - lo);
            content.extend(tail);
            let map = StepMap::Replace {
                start: from,
                old: to - from,
                new: 0,
            };
            return self.step_with_map(
                Op::ReplaceChildren {
                    path: from_path,
                    content: normalize_inline(content),
                },
                Some(map),
            );
        }

        let old_size = self.doc.content_size();
        let mut doc = self.doc.clone();
        doc.content = cut_range(&doc.content, 0, from, to);

        if from_tb && to_tb {
            join_after(&mut doc, &self.schema, from)?;
        }
        if doc.content.is_empty() {
            if let Some(kind) = self.schema.default_block_kind(&doc.kind) {
                let filler = self.schema.create_and_fill(kind, None)?;
                doc.content.push(filler);
            }
        }

        let new_size = doc.content_size();
        let removed = old_size.saturating_sub(new_size).max(to - from);
        let map = StepMap::Replace {
            start: from,
            old: removed,
            new: (new_size + removed).saturating_sub(old_size),
        };
        self.step_with_map(
            Op::ReplaceChildren {
                path: Vec::new(),
                content: doc.content,
            },
            Some(map),
        )
    }

    pub fn replace_doc_content(&mut self, content: Vec<Node>) -> Result<&mut Self, ApplyError> {
        let old = self.doc.content_size();
        let new = content.iter().map(Node::node_size).sum();
        self.step_with_map(
            Op::ReplaceChildren {
                path: Vec::new(),
                content,
            },
            Some(StepMap::Replace { start: 0, old, new }),
        )
    }

    /// Replaces `from..to` with `nodes`. Both ends must share a parent, and
    /// the result must still be valid content for it.
    pub fn replace_with(&mut self, from: usize, to: usize, nodes: Vec<Node>) -> Result<&mut Self, ApplyError> {
        if from == 0 && to == self.doc.content_size() {
            if !self.schema.valid_content(&self.doc.kind, &nodes) {
                return Err(SchemaError::InvalidContent(self.doc.kind.clone()).into());
            }
            return self.replace_doc_content(nodes);
        }
        if to < from {
            return Err(ApplyError::InvalidRange { from, to });
        }
        let (path, lo, hi) = {
            let start = self.doc.resolve(from)?;
            let end = self.doc.resolve(to)?;
            if start.parent_path() != end.parent_path() {
                return Err(ApplyError::InvalidRange { from, to });
            }
            (start.parent_path(), start.parent_offset(), end.parent_offset())
        };
        let Some(parent) = self.doc.node_at_path(&path) else {
            return Err(ApplyError::path(&path, "no such node"));
        };
        let new = nodes.iter().map(Node::node_size).sum();
        let (mut content, rest) = split_inline(&parent.content, lo);
        let (_, tail) = split_inline(&rest, hi - lo);
        content.extend(nodes);
        content.extend(tail);
        let content = if self.schema.is_textblock(&parent.kind) {
            normalize_inline(content)
        } else {
            content
        };
        if !self.schema.valid_content(&parent.kind, &content) {
            return Err(SchemaError::InvalidContent(parent.kind.clone()).into());
        }
        self.step_with_map(
            Op::ReplaceChildren { path, content },
            Some(StepMap::Replace {
                start: from,
                old: to - from,
                new,
            }),
        )
    }

    pub fn inverted(&self) -> Result<Transaction, ApplyError> {
        let mut tr = Transaction::new(self.schema.clone(), self.doc.clone(), self.selection, None);
        for op in self.inverse_ops() {
            tr.step(op)?;
        }
        Ok(tr)
    }

    /// Replaces the text block around `pos` when it is empty, or inserts
    /// `node` after it. Returns the position of the inserted node.
    pub fn insert_block_near(&mut self, pos: usize, node: Node) -> Result<usize, ApplyError> {
        let (block_path, block_pos, empty) = {
            let resolved = self.doc.resolve(pos)?;
            let depth = resolved.depth();
            if depth == 0 {
                let (index, _) = self.doc.find_index(pos);
                (vec![index], pos, false)
            } else {
                let before = resolved.before(depth).unwrap_or(pos);
                let mut path = resolved.parent_path();
                let empty = resolved.parent().content.is_empty();
                if !empty {
                    if let Some(last) = path.last_mut() {
                        *last += 1;
                    }
                }
                let at = if empty {
                    before
                } else {
                    before + resolved.parent().node_size()
                };
                (path, at, empty)
            }
        };
        if empty {
            self.step(Op::RemoveNode {
                path: block_path.clone(),
            })?;
        }
        self.step(Op::InsertNode {
            path: block_path,
            node,
        })?;
        Ok(block_pos)
    }

    /// Splits the text block at `pos`. A split at the very end starts a
    /// default block with default attributes.
    pub fn split_block(&mut self, pos: usize) -> Result<&mut Self, ApplyError> {
        let (parent_path, block_index, block, offset, at_end) = {
            let resolved = self.doc.resolve(pos)?;
            let depth = resolved.depth();
            if depth == 0 || !self.schema.is_textblock(&resolved.parent().kind) {
                return Err(ApplyError::NotInTextblock(pos));
            }
            let block = resolved.parent().clone();
            let at_end = resolved.parent_offset() == block.content_size();
            (
                resolved.path_to(depth - 1),
                resolved.index(depth - 1),
                block,
                resolved.parent_offset(),
                at_end,
            )
        };
        let Some(container) = self.doc.node_at_path(&parent_path) else {
            return Err(ApplyError::path(&parent_path, "no such node"));
        };
        let (head, tail) = split_inline(&block.content, offset);
        let first = block.clone().with_content(head);
        let second = if at_end {
            let kind = self
                .schema
                .default_block_kind(&container.kind)
                .unwrap_or(block.kind.as_str())
                .to_string();
            self.schema.node(&kind, None, Vec::new())?
        } else {
            block.clone().with_content(tail)
        };
        let mut content = container.content.clone();
        content.splice(block_index..=block_index, [first, second]);
        self.step_with_map(
            Op::ReplaceChildren {
                path: parent_path,
                content,
            },
            Some(StepMap::Replace {
                start: pos,
                old: 0,
                new: 2,
            }),
        )?;
        self.set_selection(Selection::cursor(pos + 2));
        Ok(self)
    }

    /// Sets every text block in range to `kind`. Returns whether any block
    /// changed.
    pub fn set_block_type(
        &mut self,
        from: usize,
        to: usize,
        kind: &str,
        attrs: Option<&Attrs>,
    ) -> Result<bool, ApplyError> {
        let target = self.schema.node(kind, attrs, Vec::new())?;
        let mut changed = false;
        for (path, pos) in self.textblocks_between(from, to) {
            let Some(block) = self.doc.node_at_path(&path) else {
                continue;
            };
            if block.kind == kind && block.attrs == target.attrs {
                continue;
            }
            self.set_node_markup(pos, kind, attrs)?;
            changed = true;
        }
        Ok(changed)
    }
}

pub(crate) fn node_path_at(doc: &Node, pos: usize) -> Result<Path, ApplyError> {
    let resolved = doc.resolve(pos)?;
    let depth = resolved.depth();
    match resolved.node_after() {
        Some(node) if resolved.text_offset() == 0 && !node.is_text() => {
            let mut path = resolved.path_to(depth);
            path.push(resolved.index(depth));
            Ok(path)
        }
        _ => Err(ApplyError::InvalidRange { from: pos, to: pos }),
    }
}

pub(crate) fn textblocks_between(
    doc: &Node,
    schema: &Schema,
    from: usize,
    to: usize,
) -> Vec<(Path, usize)> {
    let mut found = Vec::new();
    doc.nodes_between(from, to, |node, pos, _, _| {
        if schema.is_textblock(&node.kind) {
            found.push(pos);
            return false;
        }
        true
    });
    found
        .into_iter()
        .filter_map(|pos| node_path_at(doc, pos).ok().map(|path| (path, pos)))
        .collect()
}

fn cut_range(content: &[Node], base: usize, from: usize, to: usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(content.len());
    let mut pos = base;
    for child in content {
        let start = pos;
        let end = pos + child.node_size();
        pos = end;
        if end <= from || start >= to {
            out.push(child.clone());
        } else if start >= from && end <= to {
            continue;
        } else if let Some(text) = &child.text {
            let len = char_len(text);
            let mut kept = char_slice(text, 0, from.saturating_sub(start));
            kept.push_str(&char_slice(text, to.saturating_sub(start).min(len), len));
            let mut node = child.clone();
            node.text = Some(kept);
            out.push(node);
        } else if child.is_leaf() {
            out.push(child.clone());
        } else {
            let mut node = child.clone();
            node.content = cut_range(&child.content, start + 1, from, to);
            out.push(node);
        }
    }
    normalize_inline(out)
}

fn textblock_paths(node: &Node, schema: &Schema, path: &mut Path, out: &mut Vec<Path>) {
    for (index, child) in node.content.iter().enumerate() {
        path.push(index);
        if schema.is_textblock(&child.kind) {
            out.push(path.clone());
        } else if !child.is_inline_leaf() {
            textblock_paths(child, schema, path, out);
        }
        path.pop();
    }
}

fn join_after(doc: &mut Node, schema: &Schema, pos: usize) -> Result<(), ApplyError> {
    let first = doc.resolve(pos)?.parent_path();
    let mut all = Vec::new();
    textblock_paths(doc, schema, &mut Vec::new(), &mut all);
    let Some(ix) = all.iter().position(|path| *path == first) else {
        return Ok(());
    };
    let Some(second) = all.get(ix + 1).cloned() else {
        return Ok(());
    };

    let (parent, index) = split_parent(&second)?;
    let removed = doc.node_at_path_mut(parent)?.content.remove(index);
    let target = doc.node_at_path_mut(&first)?;
    let mut merged = std::mem::take(&mut target.content);
    merged.extend(removed.content);
    target.content = normalize_inline(merged);

    let mut container = parent.to_vec();
    while !container.is_empty() {
        let empty = doc
            .node_at_path(&container)
            .is_some_and(|node| node.content.is_empty());
        if !empty {
            break;
        }
        let (outer, index) = split_parent(&container)?;
        let outer = outer.to_vec();
        doc.node_at_path_mut(&outer)?.content.remove(index);
        container = outer;
    }
    Ok(())
}
