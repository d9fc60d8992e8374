use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use mailkit_richtext::extensions::{GlobalStyles, text_extensions};
use mailkit_richtext::{
    CommandSpec, ContentError, Editor, EditorEventKind, EditorOptions, Extension, Transaction,
};
use serde_json::{Value, json};

fn paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": text }] }]
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn editor(content: Value) -> anyhow::Result<Editor> {
    let options = EditorOptions::new(text_extensions(&GlobalStyles::default())).content(content);
    Ok(Editor::new(options)?)
}

fn record(editor: &mut Editor, kind: EditorEventKind) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&count);
    editor.on(kind, move |_, _| *seen.borrow_mut() += 1);
    count
}

#[test]
fn empty_content_becomes_one_paragraph() -> anyhow::Result<()> {
    let editor = Editor::new(EditorOptions::new(text_extensions(&GlobalStyles::default())))?;
    let doc = &editor.state().doc;
    assert_eq!(doc.content.len(), 1);
    assert_eq!(doc.content[0].kind, "paragraph");
    assert_eq!(editor.get_json()["content"][0]["type"], json!("paragraph"));
    assert_eq!(editor.get_html(), "<p></p>");
    Ok(())
}

#[test]
fn html_strings_are_refused() {
    let options = EditorOptions::new(text_extensions(&GlobalStyles::default()))
        .content(json!("<p>hello</p>"));
    assert!(matches!(Editor::new(options), Err(ContentError::Html)));
}

#[test]
fn json_output_loads_back_unchanged() -> anyhow::Result<()> {
    let source = editor(json!({
        "type": "doc",
        "content": [
            { "type": "heading", "attrs": { "level": 3, "textAlign": "right" }, "content": [{ "type": "text", "text": "T" }] },
            { "type": "paragraph", "content": [{ "type": "text", "text": "b", "marks": [{ "type": "bold" }] }] }
        ]
    }))?;
    let copy = editor(source.get_json())?;
    assert_eq!(copy.state().doc, source.state().doc);
    assert_eq!(copy.get_html(), source.get_html());
    Ok(())
}

#[test]
fn unknown_commands_fail_quietly() -> anyhow::Result<()> {
    init_tracing();
    let mut editor = editor(paragraph("a"))?;
    assert!(!editor.run_command("doesNotExist", None));
    assert!(!editor.can().command("doesNotExist", None));
    assert!(!editor.chain().command("toggleBold", None).command("doesNotExist", None).run());
    Ok(())
}

#[test]
fn chain_applies_every_command_in_one_transaction() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    let transactions = record(&mut editor, EditorEventKind::Transaction);

    let ok = editor
        .chain()
        .command("setTextSelection", Some(json!({ "from": 1, "to": 6 })))
        .command("toggleBold", None)
        .command("toggleItalic", None)
        .run();

    assert!(ok);
    assert_eq!(*transactions.borrow(), 1);
    assert_eq!(
        editor.get_html(),
        r#"<p><b style="font-weight: bold;"><i style="font-style: italic;">hello</i></b></p>"#
    );
    Ok(())
}

#[test]
fn can_does_not_touch_the_document() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    assert!(editor.run_command("setTextSelection", Some(json!({ "from": 1, "to": 3 }))));
    let before = editor.state().doc.clone();

    assert!(editor.can().command("toggleBold", None));
    assert!(editor.can().command("setContent", Some(json!({ "type": "doc" }))));
    assert_eq!(editor.state().doc, before);
    Ok(())
}

#[test]
fn update_fires_only_for_document_changes() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    let updates = record(&mut editor, EditorEventKind::Update);
    let selections = record(&mut editor, EditorEventKind::SelectionUpdate);

    assert!(editor.run_command("setTextSelection", Some(json!(3))));
    assert_eq!(*updates.borrow(), 0);
    assert_eq!(*selections.borrow(), 1);

    assert!(editor.insert_text("x"));
    assert_eq!(*updates.borrow(), 1);

    assert!(editor.set_content(paragraph("quiet"), false));
    assert_eq!(*updates.borrow(), 1);
    assert_eq!(editor.state().doc.text_content(), "quiet");

    assert!(editor.set_content(paragraph("loud"), true));
    assert_eq!(*updates.borrow(), 2);
    Ok(())
}

#[test]
fn set_content_rejects_html() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("keep"))?;
    assert!(!editor.set_content(json!("<p>nope</p>"), true));
    assert_eq!(editor.state().doc.text_content(), "keep");
    Ok(())
}

#[test]
fn focus_and_blur_are_tracked() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;
    let focus = record(&mut editor, EditorEventKind::Focus);
    let blur = record(&mut editor, EditorEventKind::Blur);

    assert!(editor.run_command("focus", None));
    assert!(editor.is_focused());
    assert!(editor.run_command("blur", None));
    assert!(!editor.is_focused());
    assert_eq!((*focus.borrow(), *blur.borrow()), (1, 1));
    Ok(())
}

#[test]
fn listeners_can_be_removed() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;
    let count = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&count);
    let id = editor.on(EditorEventKind::Transaction, move |_, _| *seen.borrow_mut() += 1);

    assert!(editor.run_command("setTextSelection", Some(json!(2))));
    assert!(editor.off(id));
    assert!(!editor.off(id));
    assert!(editor.run_command("setTextSelection", Some(json!(1))));
    assert_eq!(*count.borrow(), 1);
    Ok(())
}

#[test]
fn inverted_transaction_restores_the_document() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("hello"))?;
    let original = editor.state().doc.clone();
    let captured: Rc<RefCell<Option<Transaction>>> = Rc::default();
    let slot = Rc::clone(&captured);
    editor.on(EditorEventKind::Transaction, move |event, _| {
        if let Some(tr) = event.transaction() {
            *slot.borrow_mut() = Some(tr.clone());
        }
    });

    assert!(
        editor
            .chain()
            .command("setTextSelection", Some(json!({ "from": 2, "to": 4 })))
            .command("toggleBold", None)
            .command("insertText", Some(json!("XY")))
            .run()
    );
    assert_ne!(editor.state().doc, original);

    let last = captured.borrow_mut().take().ok_or_else(|| anyhow::anyhow!("no transaction"))?;
    editor.dispatch(last.inverted()?);
    assert_eq!(editor.state().doc, original);
    Ok(())
}

struct Widgets;

impl Extension for Widgets {
    fn name(&self) -> &str {
        "widgets"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("insertWidget", |_, _| true).requires_nodes(["widget"])]
    }
}

#[test]
fn commands_missing_schema_types_are_disabled() -> anyhow::Result<()> {
    let mut extensions = text_extensions(&GlobalStyles::default());
    extensions.push(Arc::new(Widgets));
    let mut editor = Editor::new(EditorOptions::new(extensions).content(paragraph("a")))?;

    assert!(editor.manager().command("insertWidget").is_some());
    assert!(!editor.can().command("insertWidget", None));
    assert!(!editor.run_command("insertWidget", None));
    Ok(())
}

#[test]
fn destroy_notifies_once_and_stops_dispatch() -> anyhow::Result<()> {
    let mut editor = editor(paragraph("a"))?;
    let destroyed = record(&mut editor, EditorEventKind::Destroy);

    editor.destroy();
    editor.destroy();
    assert!(editor.is_destroyed());
    assert_eq!(*destroyed.borrow(), 1);
    assert_eq!(editor.listener_count(), 0);

    editor.run_command("insertText", Some(json!("b")));
    assert_eq!(editor.state().doc.text_content(), "a");
    Ok(())
}
