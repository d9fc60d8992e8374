use mailkit_richtext::extensions::{GlobalStyles, text_extensions};
use mailkit_richtext::{Editor, EditorOptions, Node, traverse_in_range, traverse_in_range_recursively};
use serde_json::{Value, json};

fn doc(content: Value) -> anyhow::Result<Node> {
    let options = EditorOptions::new(text_extensions(&GlobalStyles::default())).content(content);
    Ok(Editor::new(options)?.state().doc.clone())
}

fn two_paragraphs() -> anyhow::Result<Node> {
    doc(json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "a" }] },
            { "type": "paragraph", "content": [{ "type": "text", "text": "b" }] }
        ]
    }))
}

/// One paragraph holding a bold "a" followed by a plain "b".
fn bold_then_plain() -> anyhow::Result<Node> {
    doc(json!({
        "type": "doc",
        "content": [{
            "type": "paragraph",
            "content": [
                { "type": "text", "text": "a", "marks": [{ "type": "bold" }] },
                { "type": "text", "text": "b" }
            ]
        }]
    }))
}

fn visits(doc: &Node, from: usize, to: usize, recursive: bool) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    let record = |ctx: &mailkit_richtext::TraverseContext<'_>| out.push((ctx.node.kind.clone(), ctx.pos));
    if recursive {
        traverse_in_range_recursively(doc, from, to, false, record);
    } else {
        traverse_in_range(doc, from, to, false, record);
    }
    out
}

fn owned(expected: &[(&str, usize)]) -> Vec<(String, usize)> {
    expected.iter().map(|(kind, pos)| (kind.to_string(), *pos)).collect()
}

#[test]
fn recursive_traversal_skips_top_level_nodes_before_the_range() -> anyhow::Result<()> {
    let doc = two_paragraphs()?;
    let expected = owned(&[("paragraph", 3), ("text", 4)]);

    assert_eq!(visits(&doc, 4, 5, true), expected);
    assert_eq!(visits(&doc, 4, 5, false), expected);
    Ok(())
}

#[test]
fn recursive_traversal_covers_every_top_level_node_in_range() -> anyhow::Result<()> {
    let doc = two_paragraphs()?;
    let expected = owned(&[("paragraph", 0), ("text", 1), ("paragraph", 3), ("text", 4)]);
    assert_eq!(visits(&doc, 0, doc.content_size(), true), expected);
    Ok(())
}

#[test]
fn recursive_traversal_reaches_siblings_ending_before_from() -> anyhow::Result<()> {
    let doc = bold_then_plain()?;

    assert_eq!(visits(&doc, 2, 3, false), owned(&[("paragraph", 0), ("text", 2)]));
    assert_eq!(
        visits(&doc, 2, 3, true),
        owned(&[("paragraph", 0), ("text", 1), ("text", 2)])
    );
    Ok(())
}

#[test]
fn children_at_or_after_to_are_left_out() -> anyhow::Result<()> {
    let doc = bold_then_plain()?;
    assert_eq!(visits(&doc, 0, 2, true), owned(&[("paragraph", 0), ("text", 1)]));
    Ok(())
}

#[test]
fn marks_are_visited_after_their_node() -> anyhow::Result<()> {
    let doc = bold_then_plain()?;
    let mut seen = Vec::new();
    traverse_in_range_recursively(&doc, 1, 3, true, |ctx| {
        seen.push((ctx.pos, ctx.mark.map(|mark| mark.kind.clone())));
    });

    assert_eq!(
        seen,
        vec![
            (0, None),
            (1, None),
            (1, Some("bold".to_string())),
            (2, None),
        ]
    );
    Ok(())
}

#[test]
fn contexts_carry_parent_index_and_depth() -> anyhow::Result<()> {
    let doc = two_paragraphs()?;
    let mut seen = Vec::new();
    traverse_in_range_recursively(&doc, 4, 5, false, |ctx| {
        seen.push((ctx.node.kind.clone(), ctx.parent.kind.clone(), ctx.index, ctx.depth));
    });

    assert_eq!(
        seen,
        vec![
            ("paragraph".to_string(), "doc".to_string(), 1, 1),
            ("text".to_string(), "paragraph".to_string(), 0, 1),
        ]
    );
    Ok(())
}
