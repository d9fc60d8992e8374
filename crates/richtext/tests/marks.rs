use mailkit_richtext::extensions::{GlobalStyles, text_extensions};
use mailkit_richtext::{Editor, EditorOptions, Node};
use serde_json::{Value, json};

fn editor_with_text(text: &str) -> anyhow::Result<Editor> {
    let content = if text.is_empty() {
        json!({ "type": "doc", "content": [{ "type": "paragraph" }] })
    } else {
        json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
        })
    };
    let options = EditorOptions::new(text_extensions(&GlobalStyles::default())).content(content);
    Ok(Editor::new(options)?)
}

fn select(editor: &mut Editor, from: usize, to: usize) {
    assert!(editor.run_command("setTextSelection", Some(json!({ "from": from, "to": to }))));
}

fn inline_nodes(editor: &Editor) -> Vec<Node> {
    editor.state().doc.content[0].content.clone()
}

fn mark_kinds(node: &Node) -> Vec<&str> {
    node.marks.iter().map(|mark| mark.kind.as_str()).collect()
}

#[test]
fn toggle_bold_wraps_and_unwraps_the_selection() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello world")?;
    select(&mut editor, 1, 6);

    assert!(editor.run_command("toggleBold", None));
    assert_eq!(
        editor.get_html(),
        r#"<p><b style="font-weight: bold;">hello</b> world</p>"#
    );
    assert!(editor.is_active(Some("bold"), None));

    assert!(editor.run_command("toggleBold", None));
    assert_eq!(editor.get_html(), "<p>hello world</p>");
    assert!(!editor.is_active(Some("bold"), None));
    Ok(())
}

#[test]
fn setting_a_mark_skips_surrounding_whitespace() -> anyhow::Result<()> {
    let mut editor = editor_with_text("a  word  b")?;
    select(&mut editor, 2, 10);

    assert!(editor.run_command("setItalic", None));
    assert_eq!(
        editor.get_html(),
        r#"<p>a  <i style="font-style: italic;">word</i>  b</p>"#
    );
    Ok(())
}

#[test]
fn shortcut_toggles_mark() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello")?;
    select(&mut editor, 1, 6);

    assert!(editor.handle_key("Mod-u"));
    assert_eq!(
        editor.get_html(),
        r#"<p><u style="text-decoration: underline;">hello</u></p>"#
    );
    Ok(())
}

#[test]
fn cursor_toggle_applies_to_next_typed_text() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello")?;
    select(&mut editor, 6, 6);

    assert!(editor.run_command("toggleBold", None));
    assert!(editor.is_active(Some("bold"), None));
    assert!(editor.insert_text("!"));

    let nodes = inline_nodes(&editor);
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].text_str(), "!");
    assert_eq!(mark_kinds(&nodes[1]), vec!["bold"]);
    assert!(editor.state().stored_marks.is_none());
    Ok(())
}

#[test]
fn superscript_replaces_subscript() -> anyhow::Result<()> {
    let mut editor = editor_with_text("x2")?;
    select(&mut editor, 2, 3);

    assert!(editor.run_command("toggleSubscript", None));
    assert!(editor.run_command("toggleSuperscript", None));

    let nodes = inline_nodes(&editor);
    assert_eq!(mark_kinds(&nodes[1]), vec!["superscript"]);
    Ok(())
}

#[test]
fn unset_all_marks_clears_the_selection() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello")?;
    select(&mut editor, 1, 6);
    assert!(editor.run_command("toggleBold", None));
    assert!(editor.run_command("toggleStrike", None));

    assert!(editor.run_command("unsetAllMarks", None));
    assert_eq!(editor.get_html(), "<p>hello</p>");
    Ok(())
}

#[test]
fn closing_delimiter_turns_text_bold() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello **bold*")?;
    select(&mut editor, 14, 14);

    assert!(editor.insert_text("*"));
    assert_eq!(
        editor.get_html(),
        r#"<p>hello <b style="font-weight: bold;">bold</b></p>"#
    );
    Ok(())
}

#[test]
fn double_underscore_is_underline_not_italic() -> anyhow::Result<()> {
    let mut editor = editor_with_text("__under_")?;
    select(&mut editor, 9, 9);

    assert!(editor.insert_text("_"));
    let nodes = inline_nodes(&editor);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].text_str(), "under");
    assert_eq!(mark_kinds(&nodes[0]), vec!["underline"]);
    Ok(())
}

#[test]
fn delimiter_inside_a_word_is_plain_text() -> anyhow::Result<()> {
    let mut editor = editor_with_text("a*b")?;
    select(&mut editor, 4, 4);

    assert!(editor.insert_text("*"));
    assert_eq!(editor.get_html(), "<p>a*b*</p>");
    Ok(())
}

#[test]
fn pasted_delimiters_become_marks() -> anyhow::Result<()> {
    let mut editor = editor_with_text("")?;

    assert!(editor.paste_text("a **b** c"));
    assert_eq!(
        editor.get_html(),
        r#"<p>a <b style="font-weight: bold;">b</b> c</p>"#
    );
    Ok(())
}

#[test]
fn mark_attributes_are_queryable() -> anyhow::Result<()> {
    let mut editor = editor_with_text("hello")?;
    select(&mut editor, 1, 6);
    assert!(editor.run_command("setColor", Some(json!({ "color": "#ff0000" }))));

    let attrs = editor.get_attributes("color");
    assert_eq!(attrs.get("color"), Some(&Value::from("#ff0000")));
    assert!(editor.is_active(Some("color"), Some(&json!({ "color": "#ff0000" }))));
    assert!(!editor.is_active(Some("color"), Some(&json!({ "color": "#00ff00" }))));
    Ok(())
}
