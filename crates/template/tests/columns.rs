mod support;

use mailkit_history::CommandType;
use mailkit_template::{
    AddColumnCommand, BlockEntity, ColumnCoordinates, ColumnUpdate, DeleteColumnCommand,
    MoveColumnCommand, TemplateError, UpdateColumnCommand,
};
use support::{column, history, sample_store, snapshot, text_content, widths};

#[test]
fn add_column_copies_with_fresh_ids() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);
    let source = column(20, vec![BlockEntity::text(text_content("new"))]);

    history.execute_command(
        &mut store,
        AddColumnCommand::new(&source, ColumnCoordinates::new(1, 1)),
        CommandType::RowUpdate,
    )?;
    let added = &store.rows()[1].columns[1];
    assert_ne!(added.id, source.id);
    assert_ne!(added.blocks[0].id(), source.blocks[0].id());
    assert_eq!(store.column_coordinates(&added.id), Some(ColumnCoordinates::new(1, 1)));
    assert_eq!(widths(&store, 1), vec![100, 20]);

    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn column_commands_reject_bad_coordinates() {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);

    let err = history
        .execute_command(
            &mut store,
            AddColumnCommand::new(&column(10, Vec::new()), ColumnCoordinates::new(0, 3)),
            CommandType::RowUpdate,
        )
        .unwrap_err();
    assert!(matches!(err, TemplateError::ColumnOutOfRange { row: 0, index: 3, len: 2 }));

    let err = history
        .execute_command(&mut store, DeleteColumnCommand::new(ColumnCoordinates::new(4, 0)), CommandType::RowUpdate)
        .unwrap_err();
    assert!(matches!(err, TemplateError::RowOutOfRange { index: 4, len: 2 }));

    let err = history
        .execute_command(&mut store, MoveColumnCommand::new(0, 0, 2), CommandType::RowUpdate)
        .unwrap_err();
    assert!(matches!(err, TemplateError::ColumnOutOfRange { row: 0, index: 2, len: 2 }));

    assert_eq!(snapshot(&store), before);
    assert!(!history.can_undo());
}

#[test]
fn delete_and_move_columns_undo_cleanly() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let before = snapshot(&store);
    let left = store.rows()[0].columns[0].id.clone();
    let right = store.rows()[0].columns[1].id.clone();
    let right_block = store.rows()[0].columns[1].blocks[0].id().to_string();

    history.execute_command(&mut store, MoveColumnCommand::new(0, 0, 1), CommandType::RowUpdate)?;
    assert_eq!(store.rows()[0].columns[0].id, right);
    assert_eq!(store.block_coordinates(&right_block).map(|at| at.column_index), Some(0));

    history.execute_command(&mut store, DeleteColumnCommand::new(ColumnCoordinates::new(0, 1)), CommandType::RowUpdate)?;
    assert_eq!(store.column_coordinates(&left), None);
    assert_eq!(store.rows()[0].columns.len(), 1);

    history.undo(&mut store)?;
    history.undo(&mut store)?;
    assert_eq!(snapshot(&store), before);
    Ok(())
}

#[test]
fn update_column_changes_only_given_fields() -> anyhow::Result<()> {
    let mut store = sample_store();
    let mut history = history();
    let at = ColumnCoordinates::new(0, 1);
    let blocks_before = store.column(at)?.blocks.clone();

    history.execute_command(&mut store, UpdateColumnCommand::new(at, ColumnUpdate::width(35)), CommandType::RowUpdate)?;
    assert_eq!(store.column(at)?.width, 35);
    assert_eq!(store.column(at)?.blocks, blocks_before);

    history.undo(&mut store)?;
    assert_eq!(store.column(at)?.width, 50);
    Ok(())
}
