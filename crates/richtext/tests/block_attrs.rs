use std::collections::BTreeMap;

use mailkit_richtext::extensions::{GlobalStyles, StyleDefaults, button_extensions, text_extensions};
use mailkit_richtext::{Editor, EditorOptions};
use serde_json::{Value, json};

fn editor_with(styles: &GlobalStyles, content: Value) -> anyhow::Result<Editor> {
    let options = EditorOptions::new(text_extensions(styles)).content(content);
    Ok(Editor::new(options)?)
}

fn editor(content: Value) -> anyhow::Result<Editor> {
    editor_with(&GlobalStyles::default(), content)
}

fn paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
    })
}

#[test]
fn toggle_heading_switches_between_heading_and_paragraph() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("Title"))?;

    assert!(editor.run_command("toggleHeading", Some(json!({ "level": 2 }))));
    assert_eq!(editor.get_html(), "<h2>Title</h2>");
    assert!(editor.is_active(Some("heading"), Some(&json!({ "level": 2 }))));

    assert!(editor.run_command("toggleHeading", Some(json!({ "level": 3 }))));
    assert_eq!(editor.get_html(), "<h3>Title</h3>");

    assert!(editor.run_command("toggleHeading", Some(json!({ "level": 3 }))));
    assert_eq!(editor.get_html(), "<p>Title</p>");

    assert!(!editor.run_command("toggleHeading", Some(json!({ "level": 7 }))));
    Ok(())
}

#[test]
fn hashes_and_space_make_a_heading() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("##"))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.insert_text(" "));
    let block = &editor.state().doc.content[0];
    assert_eq!(block.kind, "heading");
    assert_eq!(block.attr("level"), Some(&json!(2)));
    assert_eq!(block.content_size(), 0);
    Ok(())
}

#[test]
fn text_align_toggles_back_to_left() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;

    assert!(editor.run_command("toggleTextAlign", Some(json!("center"))));
    assert_eq!(editor.get_html(), r#"<p style="text-align: center">a</p>"#);

    assert!(editor.run_command("toggleTextAlign", Some(json!("center"))));
    assert_eq!(editor.get_html(), "<p>a</p>");

    assert!(!editor.run_command("toggleTextAlign", Some(json!("middle"))));
    Ok(())
}

#[test]
fn direction_is_set_and_toggled_off() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;

    assert!(editor.run_command("setTextDirection", Some(json!("rtl"))));
    assert_eq!(editor.get_html(), r#"<p dir="rtl">a</p>"#);

    assert!(editor.run_command("toggleTextDirection", Some(json!("rtl"))));
    assert_eq!(editor.state().doc.content[0].attr_str("textDirection"), None);
    assert_eq!(editor.get_html(), "<p>a</p>");

    assert!(!editor.run_command("setTextDirection", Some(json!("up"))));
    Ok(())
}

#[test]
fn direction_reaches_nested_lists() -> anyhow::Result<()> {
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
                        "content": [{
                            "type": "listItem",
                            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "b" }] }]
                        }]
                    }
                ]
            }]
        }]
    }))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.run_command("setTextDirection", Some(json!("rtl"))));
    let root = &editor.state().doc.content[0];
    let nested = &root.content[0].content[1];
    assert_eq!(root.attr_str("textDirection"), Some("rtl"));
    assert_eq!(nested.attr_str("textDirection"), Some("rtl"));

    let html = editor.get_html();
    assert!(html.starts_with(r#"<ul style="list-style-type: disc; padding-right: 40px" dir="rtl">"#));
    Ok(())
}

#[test]
fn indentation_steps_and_stops_at_the_minimum() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;

    assert!(editor.run_command("setIndentation", Some(json!(40))));
    assert_eq!(editor.get_html(), r#"<p style="padding-left: 40px">a</p>"#);

    assert!(editor.run_command("setIndentation", Some(json!({ "delta": -80 }))));
    assert_eq!(editor.state().doc.content[0].attr("indentation"), Some(&json!(0)));

    assert!(!editor.run_command("setIndentation", Some(json!(-40))));
    Ok(())
}

#[test]
fn lists_indent_as_a_whole() -> anyhow::Result<()> {
    let mut editor = editor(json!({
        "type": "doc",
        "content": [{
            "type": "orderedList",
            "content": [{
                "type": "listItem",
                "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "a" }] }]
            }]
        }]
    }))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(!editor.run_command("setIndentation", Some(json!(-40))));
    assert!(editor.run_command("setIndentation", Some(json!(40))));
    let list = &editor.state().doc.content[0];
    assert_eq!(list.attr("indentation"), Some(&json!(80)));
    assert_eq!(list.content[0].content[0].attr("indentation"), Some(&json!(0)));
    Ok(())
}

#[test]
fn font_size_on_a_range_uses_a_mark() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    assert!(editor.run_command("setTextSelection", Some(json!({ "from": 1, "to": 6 }))));

    assert!(editor.run_command("setFontSize", Some(json!({ "fontSize": "18px" }))));
    assert_eq!(
        editor.get_html(),
        r#"<p><span style="font-size: 18px">hello</span></p>"#
    );

    assert!(editor.run_command("unsetFontSize", None));
    assert_eq!(editor.get_html(), "<p>hello</p>");
    Ok(())
}

#[test]
fn font_size_at_cursor_styles_the_block() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    assert!(editor.run_command("setTextSelection", Some(json!(3))));

    assert!(editor.run_command("setFontSize", Some(json!("18px"))));
    assert_eq!(editor.get_html(), r#"<p style="font-size: 18px">hello</p>"#);

    assert!(editor.run_command("unsetFontSize", None));
    assert_eq!(editor.get_html(), "<p>hello</p>");
    Ok(())
}

#[test]
fn global_defaults_fill_unstyled_blocks_and_links() -> anyhow::Result<()> {
    let styles = GlobalStyles {
        font_size: StyleDefaults {
            paragraph: Some("14px".to_string()),
            heading: BTreeMap::from([(1, "32px".to_string())]),
            link: None,
        },
        color: StyleDefaults {
            link: Some("#0000ff".to_string()),
            ..StyleDefaults::default()
        },
        ..GlobalStyles::default()
    };
    let editor = editor_with(&styles, json!({
        "type": "doc",
        "content": [
            { "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "T" }] },
            { "type": "heading", "attrs": { "level": 2 }, "content": [{ "type": "text", "text": "S" }] },
            {
                "type": "paragraph",
                "attrs": { "fontSize": "20px" },
                "content": [{ "type": "text", "text": "x", "marks": [{ "type": "link", "attrs": { "href": "https://a.io" } }] }]
            },
            { "type": "paragraph", "content": [{ "type": "text", "text": "y" }] }
        ]
    }))?;

    assert_eq!(
        editor.get_html(),
        concat!(
            r#"<h1 style="font-size: 32px">T</h1>"#,
            "<h2>S</h2>",
            r#"<p style="font-size: 20px"><a href="https://a.io" target="_blank" rel="noopener noreferrer" style="color: #0000ff">x</a></p>"#,
            r#"<p style="font-size: 14px">y</p>"#,
        )
    );
    Ok(())
}

#[test]
fn insert_symbol_types_at_the_cursor() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("ab"))?;
    assert!(editor.run_command("setTextSelection", Some(json!(2))));

    assert!(editor.can().command("insertSymbol", Some(json!("★"))));
    assert_eq!(editor.get_html(), "<p>ab</p>");

    assert!(editor.run_command("insertSymbol", Some(json!({ "symbol": "★" }))));
    assert_eq!(editor.get_html(), "<p>a★b</p>");
    Ok(())
}

#[test]
fn button_labels_break_lines_on_enter() -> anyhow::Result<()> {
    let mut editor = Editor::new(
        EditorOptions::new(button_extensions())
            .content(json!({ "type": "doc", "content": [{ "type": "text", "text": "Click" }] })),
    )?;
    assert!(editor.run_command("setTextSelection", Some(json!(5))));

    assert!(editor.handle_key("Enter"));
    assert_eq!(editor.get_html(), "Click<br>");
    assert!(editor.manager().command("toggleBold").is_none());
    Ok(())
}
