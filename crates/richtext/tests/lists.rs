use mailkit_richtext::extensions::{GlobalStyles, text_extensions};
use mailkit_richtext::{Editor, EditorOptions, Node};
use serde_json::{Value, json};

fn editor(content: Value) -> anyhow::Result<Editor> {
    let options = EditorOptions::new(text_extensions(&GlobalStyles::default())).content(content);
    Ok(Editor::new(options)?)
}

fn item(text: &str) -> Value {
    let paragraph = if text.is_empty() {
        json!({ "type": "paragraph" })
    } else {
        json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })
    };
    json!({ "type": "listItem", "content": [paragraph] })
}

fn bullet_list(items: &[&str]) -> Value {
    json!({
        "type": "doc",
        "content": [{
            "type": "bulletList",
            "content": items.iter().map(|text| item(text)).collect::<Vec<_>>()
        }]
    })
}

fn paragraphs(texts: &[&str]) -> Value {
    json!({
        "type": "doc",
        "content": texts
            .iter()
            .map(|text| json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] }))
            .collect::<Vec<_>>()
    })
}

fn top(editor: &Editor) -> &[Node] {
    &editor.state().doc.content
}

#[test]
fn toggle_bullet_list_wraps_and_unwraps() -> anyhow::Result<()> {
    let mut editor = editor(paragraphs(&["a"]))?;
    let original = editor.state().doc.clone();

    assert!(editor.run_command("toggleBulletList", None));
    assert_eq!(top(&editor)[0].kind, "bulletList");
    assert_eq!(top(&editor)[0].attr_str("listStyleType"), Some("disc"));
    assert_eq!(
        editor.get_html(),
        r#"<ul style="list-style-type: disc; padding-left: 40px"><li><p>a</p></li></ul>"#
    );

    assert!(editor.run_command("toggleBulletList", None));
    assert_eq!(editor.state().doc, original);
    Ok(())
}

#[test]
fn toggle_wraps_every_selected_paragraph() -> anyhow::Result<()> {
    let mut editor = editor(paragraphs(&["a", "b", "c"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!({ "from": 1, "to": 5 }))));

    assert!(editor.run_command("toggleOrderedList", None));
    let doc = &editor.state().doc;
    assert_eq!(doc.child_count(), 2);
    assert_eq!(doc.content[0].kind, "orderedList");
    assert_eq!(doc.content[0].child_count(), 2);
    assert_eq!(doc.content[1].kind, "paragraph");
    Ok(())
}

#[test]
fn toggle_converts_list_kind_and_style() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["a", "b"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.run_command("toggleOrderedList", Some(json!({ "listStyleType": "lower-roman" }))));
    let list = &top(&editor)[0];
    assert_eq!(list.kind, "orderedList");
    assert_eq!(list.attr_str("listStyleType"), Some("lower-roman"));
    assert_eq!(list.child_count(), 2);
    Ok(())
}

#[test]
fn toggle_converts_nested_lists_with_their_root() -> anyhow::Result<()> {
    let mut editor = editor(json!({
        "type": "doc",
        "content": [{
            "type": "bulletList",
            "content": [{
                "type": "listItem",
                "content": [
                    { "type": "paragraph", "content": [{ "type": "text", "text": "a" }] },
                    {
                        "type": "bulletList",
                        "content": [item("b")]
                    }
                ]
            }]
        }]
    }))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.run_command("toggleOrderedList", None));
    let root = &top(&editor)[0];
    let nested = &root.content[0].content[1];
    assert_eq!(root.kind, "orderedList");
    assert_eq!(nested.kind, "orderedList");
    assert_eq!(nested.content[0].text_content(), "b");
    Ok(())
}

#[test]
fn toggle_rejects_unknown_style() -> anyhow::Result<()> {
    let mut editor = editor(paragraphs(&["a"]))?;
    assert!(!editor.run_command("toggleBulletList", Some(json!({ "listStyleType": "lower-roman" }))));
    assert_eq!(top(&editor)[0].kind, "paragraph");
    Ok(())
}

#[test]
fn dash_and_space_start_a_bullet_list() -> anyhow::Result<()> {
    let mut editor = editor(paragraphs(&["-"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(2))));

    assert!(editor.insert_text(" "));
    let list = &top(&editor)[0];
    assert_eq!(list.kind, "bulletList");
    assert_eq!(list.content[0].content[0].kind, "paragraph");
    assert_eq!(list.content[0].content[0].content_size(), 0);
    Ok(())
}

#[test]
fn number_and_dot_start_an_ordered_list() -> anyhow::Result<()> {
    let mut editor = editor(paragraphs(&["1."]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.insert_text(" "));
    assert_eq!(top(&editor)[0].kind, "orderedList");
    Ok(())
}

#[test]
fn tab_nests_and_shift_tab_lifts_back() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["a", "b"]))?;
    let original = editor.state().doc.clone();
    assert!(editor.run_command("setTextSelection", Some(json!(8))));

    assert!(editor.handle_key("Tab"));
    let list = &top(&editor)[0];
    assert_eq!(list.child_count(), 1);
    let nested = &list.content[0].content[1];
    assert_eq!(nested.kind, "bulletList");
    assert_eq!(nested.content[0].text_content(), "b");

    assert!(editor.handle_key("Shift-Tab"));
    assert_eq!(editor.state().doc, original);
    Ok(())
}

#[test]
fn first_item_cannot_be_nested() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["a", "b"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(!editor.run_command("sinkListItem", None));
    assert!(!editor.handle_key("Tab"));
    Ok(())
}

#[test]
fn enter_splits_an_item() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["ab"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(4))));

    assert!(editor.handle_key("Enter"));
    let list = &top(&editor)[0];
    assert_eq!(list.child_count(), 2);
    assert_eq!(list.content[0].text_content(), "a");
    assert_eq!(list.content[1].text_content(), "b");
    assert_eq!(editor.state().selection.head, 8);
    Ok(())
}

#[test]
fn enter_in_an_empty_item_leaves_the_list() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["a", ""]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(8))));

    assert!(editor.handle_key("Enter"));
    let doc = &editor.state().doc;
    assert_eq!(doc.child_count(), 2);
    assert_eq!(doc.content[0].kind, "bulletList");
    assert_eq!(doc.content[0].child_count(), 1);
    assert_eq!(doc.content[1].kind, "paragraph");
    Ok(())
}

#[test]
fn backspace_in_an_empty_first_item_lifts_it() -> anyhow::Result<()> {
    let mut editor = editor(bullet_list(&["", "b"]))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.handle_key("Backspace"));
    let doc = &editor.state().doc;
    assert_eq!(doc.content[0].kind, "paragraph");
    assert_eq!(doc.content[1].kind, "bulletList");
    Ok(())
}
