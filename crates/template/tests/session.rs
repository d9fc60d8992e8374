mod support;

use mailkit_template::{BlockEditingSession, BlockType, TemplateError};
use serde_json::json;
use support::{history, plain_text, sample_store};

#[test]
fn commit_records_one_block_update() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let block_id = store.rows()[0].columns[0].blocks[0].id().to_string();

    let mut session = BlockEditingSession::open(&store, &mut history, &block_id)?;
    assert!(!session.commit(&mut store, &mut history)?);

    assert!(session.run_command("setTextSelection", Some(json!(1))));
    assert!(session.insert_text("Hi "));
    assert!(session.has_pending_edits());
    assert!(session.commit(&mut store, &mut history)?);
    assert!(!session.has_pending_edits());

    assert_eq!(history.timeline().len(), 1);
    assert_eq!(history.timeline()[0].kind().as_str(), "block.update");
    let stored = store.block_by_id(&block_id)?.content();
    assert_eq!(plain_text(&stored.json), "Hi one");
    assert_eq!(stored.html, session.editor().get_html());

    // Nothing pending until the history moves.
    assert!(!session.sync());
    session.close(&mut history);
    Ok(())
}

#[test]
fn undo_and_redo_resync_the_editor_without_new_entries() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let block_id = store.rows()[1].columns[0].blocks[0].id().to_string();

    let mut session = BlockEditingSession::open(&store, &mut history, &block_id)?;
    session.run_command("setTextSelection", Some(json!(1)));
    session.insert_text("all ");
    session.commit(&mut store, &mut history)?;

    assert!(history.undo(&mut store)?);
    assert!(session.sync());
    assert_eq!(plain_text(&session.editor().get_json()), "three");
    assert!(!session.has_pending_edits());
    assert!(!session.commit(&mut store, &mut history)?);

    assert!(history.redo(&mut store)?);
    assert!(session.sync());
    assert_eq!(plain_text(&session.editor().get_json()), "all three");

    assert_eq!(history.timeline().len(), 1);
    assert!(!history.can_redo());
    session.close(&mut history);
    Ok(())
}

#[test]
fn closed_sessions_stop_listening() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let block_id = store.rows()[0].columns[1].blocks[0].id().to_string();

    let mut first = BlockEditingSession::open(&store, &mut history, &block_id)?;
    first.run_command("setTextSelection", Some(json!(1)));
    first.insert_text("x");
    first.commit(&mut store, &mut history)?;
    first.close(&mut history);

    let mut second = BlockEditingSession::open(&store, &mut history, &block_id)?;
    assert_eq!(plain_text(&second.editor().get_json()), "xtwo");
    history.undo(&mut store)?;
    assert!(second.sync());
    assert_eq!(plain_text(&second.editor().get_json()), "two");
    second.close(&mut history);
    Ok(())
}

#[test]
fn button_blocks_open_with_the_button_schema() -> anyhow::Result<()> {
    let store = sample_store();
    let mut history = history();
    let button = store.blocks_by_types(&[BlockType::Button])[0].1.id().to_string();

    let mut session = BlockEditingSession::open(&store, &mut history, &button)?;
    assert_eq!(session.block_id(), button);
    assert_eq!(session.editor().get_html(), "Go");
    assert!(!session.run_command("toggleBold", None));
    session.close(&mut history);

    let err = BlockEditingSession::open(&store, &mut history, "missing").unwrap_err();
    assert!(matches!(err, TemplateError::UnknownNode(id) if id == "missing"));
    Ok(())
}
