mod support;

use std::collections::BTreeMap;

use mailkit_history::CommandType;
use mailkit_template::{
    AddBlockCommand, BlockCoordinates, BlockEntity, BlockType, BlockUpdate, CloneBlockCommand,
    DeleteBlockCommand, MoveBlockCommand, NodeRef, TemplateError, UpdateBlockCommand,
};
use serde_json::json;
use support::{button_content, history, sample_store, snapshot, text_content};

#[test]
fn add_block_gets_a_fresh_id() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);
    let source = BlockEntity::button(button_content("Buy"));

    let command = AddBlockCommand::new(&source, BlockCoordinates::new(1, 0, 1));
    let id = command.block_id().map(str::to_string).unwrap_or_default();
    assert_ne!(id, source.id());
    history.execute_command(&mut store, command, CommandType::BlockAdd)?;

    assert_eq!(store.block_coordinates(&id), Some(BlockCoordinates::new(1, 0, 1)));
    assert!(matches!(store.node(&id), Some(NodeRef::Block(block)) if block.kind() == BlockType::Button));

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    assert!(store.node(&id).is_none());
    Ok(())
}

#[test]
fn block_commands_reject_bad_coordinates() {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);

    let err = history
        .execute_command(
            &mut store,
            AddBlockCommand::new(&BlockEntity::text(text_content("x")), BlockCoordinates::new(0, 1, 3)),
            CommandType::BlockAdd,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::BlockOutOfRange { row: 0, column: 1, index: 3, len: 1 }
    ));

    let err = history
        .execute_command(&mut store, DeleteBlockCommand::new(BlockCoordinates::new(0, 2, 0)), CommandType::BlockDelete)
        .unwrap_err();
    assert!(matches!(err, TemplateError::ColumnOutOfRange { row: 0, index: 2, len: 2 }));

    let err = history
        .execute_command(
            &mut store,
            MoveBlockCommand::new(BlockCoordinates::new(0, 0, 0), BlockCoordinates::new(1, 0, 2)),
            CommandType::BlockMove,
        )
        .unwrap_err();
    assert!(matches!(err, TemplateError::BlockOutOfRange { index: 2, len: 1, .. }));

    assert_eq!(snapshot(&store), before);
    assert!(!history.can_undo());
}

#[test]
fn move_block_across_columns_and_back() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);
    let button = store.rows()[0].columns[0].blocks[1].id().to_string();

    history.execute_command(
        &mut store,
        MoveBlockCommand::new(BlockCoordinates::new(0, 0, 1), BlockCoordinates::new(1, 0, 0)),
        CommandType::BlockMove,
    )?;
    assert_eq!(store.block_coordinates(&button), Some(BlockCoordinates::new(1, 0, 0)));
    assert_eq!(store.rows()[0].columns[0].blocks.len(), 1);
    assert_eq!(store.rows()[1].columns[0].blocks.len(), 2);

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn move_block_within_a_column_addresses_the_shortened_list() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let text = store.rows()[0].columns[0].blocks[0].id().to_string();

    history.execute_command(
        &mut store,
        MoveBlockCommand::new(BlockCoordinates::new(0, 0, 0), BlockCoordinates::new(0, 0, 1)),
        CommandType::BlockMove,
    )?;
    assert_eq!(store.block_coordinates(&text), Some(BlockCoordinates::new(0, 0, 1)));
    assert_eq!(store.rows()[0].columns[0].blocks[0].kind(), BlockType::Button);

    let err = history
        .execute_command(
            &mut store,
            MoveBlockCommand::new(BlockCoordinates::new(0, 0, 0), BlockCoordinates::new(0, 0, 2)),
            CommandType::BlockMove,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::BlockOutOfRange { row: 0, column: 0, index: 2, len: 2 }
    ));
    assert_eq!(store.block_coordinates(&text), Some(BlockCoordinates::new(0, 0, 1)));
    Ok(())
}

#[test]
fn delete_and_clone_blocks() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);
    let source = store.rows()[0].columns[1].blocks[0].clone();

    history.execute_command(
        &mut store,
        CloneBlockCommand::new(BlockCoordinates::new(0, 1, 0), BlockCoordinates::new(1, 0, 0)),
        CommandType::BlockClone,
    )?;
    let clone = store.rows()[1].columns[0].blocks[0].clone();
    assert_ne!(clone.id(), source.id());
    assert_eq!(clone.content(), source.content());

    history.execute_command(&mut store, DeleteBlockCommand::new(BlockCoordinates::new(0, 1, 0)), CommandType::BlockDelete)?;
    assert!(store.rows()[0].columns[1].blocks.is_empty());
    assert!(store.block_by_id(source.id()).is_err());

    history.undo(&mut store)?;
    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);

    history.redo(&mut store)?;
    assert_eq!(store.rows()[1].columns[0].blocks[0], clone);
    Ok(())
}

#[test]
fn update_block_replaces_style_and_content() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let at = BlockCoordinates::new(0, 0, 0);
    let original = store.block(at)?.clone();

    let style = BTreeMap::from([("padding".to_string(), json!("8px"))]);
    let update = BlockUpdate {
        style: Some(style.clone()),
        content: Some(text_content("changed")),
    };
    let command = UpdateBlockCommand::new(at, update);
    assert_eq!(command.coordinates(), at);
    history.execute_command(&mut store, command, CommandType::BlockUpdate)?;

    let block = store.block(at)?;
    assert_eq!(block.id(), original.id());
    assert_eq!(block.style(), &style);
    assert_eq!(block.content().html, "<p>changed</p>");

    history.undo(&mut store)?;
    assert_eq!(store.block(at)?, &original);
    Ok(())
}
