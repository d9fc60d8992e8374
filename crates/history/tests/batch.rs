mod support;

use mailkit_history::{BatchCommand, BoxedCommand, Command};
use support::{DoubleLast, Fail, Journal, Push};

#[test]
fn batch_executes_in_order_and_undoes_in_reverse() {
    let mut journal = Journal::default();
    let mut batch = BatchCommand::new();
    assert!(batch.is_empty());

    batch.add(Push::new(1));
    batch.add(Push::new(2));
    batch.add(DoubleLast::new());
    assert!(!batch.is_empty());
    assert_eq!(batch.len(), 3);

    batch.execute(&mut journal).unwrap();
    assert_eq!(journal.values, vec![1, 4]);

    batch.undo(&mut journal).unwrap();
    assert!(journal.values.is_empty());
    assert_eq!(
        journal.calls,
        vec![
            "execute 1",
            "execute 2",
            "execute double",
            "undo double",
            "undo 2",
            "undo 1",
        ]
    );
}

#[test]
fn batch_built_from_fixed_array() {
    let mut journal = Journal::default();
    let commands: Vec<BoxedCommand<Journal, String>> =
        vec![Box::new(Push::new(7)), Box::new(DoubleLast::new())];
    let mut batch = BatchCommand::from_commands(commands);

    batch.execute(&mut journal).unwrap();
    assert_eq!(journal.values, vec![14]);
    batch.undo(&mut journal).unwrap();
    assert!(journal.values.is_empty());
}

#[test]
fn undo_before_execute_is_a_no_op() {
    let mut journal = Journal::default();
    let mut batch = BatchCommand::new().with(Push::new(3)).with(DoubleLast::new());

    batch.undo(&mut journal).unwrap();
    assert!(journal.values.is_empty());
    assert!(journal.calls.is_empty());
}

#[test]
fn failing_member_rolls_back_earlier_members() {
    let mut journal = Journal::default();
    let mut batch = BatchCommand::new()
        .with(Push::new(1))
        .with(Push::new(2))
        .with(Fail)
        .with(Push::new(3));

    let err = batch.execute(&mut journal).unwrap_err();
    assert_eq!(err, "boom");
    assert!(journal.values.is_empty());
    assert_eq!(
        journal.calls,
        vec!["execute 1", "execute 2", "execute fail", "undo 2", "undo 1"]
    );
}

#[test]
fn empty_batch_is_harmless() {
    let mut journal = Journal::default();
    let mut batch: BatchCommand<Journal, String> = BatchCommand::default();
    batch.execute(&mut journal).unwrap();
    batch.undo(&mut journal).unwrap();
    assert!(journal.calls.is_empty());
    assert_eq!(format!("{batch:?}"), "[]");
}
