use crate::core::{Mark, Node};

/// One visit during a range traversal. Marked nodes are visited once
/// plainly and once per mark, with `mark` set.
#[derive(Debug, Clone, Copy)]
pub struct TraverseContext<'a> {
    pub node: &'a Node,
    pub pos: usize,
    pub parent: &'a Node,
    pub index: usize,
    pub depth: usize,
    pub mark: Option<&'a Mark>,
}

fn depth_at(doc: &Node, pos: usize) -> usize {
    doc.resolve((pos + 1).min(doc.content_size()))
        .map(|resolved| resolved.depth())
        .unwrap_or(0)
}

fn visit<'a>(
    doc: &'a Node,
    node: &'a Node,
    pos: usize,
    parent: &'a Node,
    index: usize,
    include_marks: bool,
    f: &mut impl FnMut(&TraverseContext<'a>),
) {
    let ctx = TraverseContext {
        node,
        pos,
        parent,
        index,
        depth: depth_at(doc, pos),
        mark: None,
    };
    f(&ctx);
    if include_marks {
        for mark in &node.marks {
            f(&TraverseContext {
                mark: Some(mark),
                ..ctx
            });
        }
    }
}

pub fn traverse_in_range<'a>(
    doc: &'a Node,
    from: usize,
    to: usize,
    include_marks: bool,
    mut f: impl FnMut(&TraverseContext<'a>),
) {
    doc.nodes_between(from, to, |node, pos, parent, index| {
        visit(doc, node, pos, parent, index, include_marks, &mut f);
        true
    });
}

/// Like [`traverse_in_range`], but below each top-level hit it descends
/// into every child starting before `to`, even children that end before
/// `from`.
pub fn traverse_in_range_recursively<'a>(
    doc: &'a Node,
    from: usize,
    to: usize,
    include_marks: bool,
    mut f: impl FnMut(&TraverseContext<'a>),
) {
    fn descend<'a>(
        doc: &'a Node,
        node: &'a Node,
        pos: usize,
        to: usize,
        include_marks: bool,
        f: &mut impl FnMut(&TraverseContext<'a>),
    ) {
        let mut child_pos = pos + 1;
        for (index, child) in node.content.iter().enumerate() {
            if child_pos < to {
                visit(doc, child, child_pos, node, index, include_marks, f);
                descend(doc, child, child_pos, to, include_marks, f);
            }
            child_pos += child.node_size();
        }
    }

    doc.nodes_between(from, to, |node, pos, parent, index| {
        visit(doc, node, pos, parent, index, include_marks, &mut f);
        descend(doc, node, pos, to, include_marks, &mut f);
        false
    });
}
