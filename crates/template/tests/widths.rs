mod support;

use std::collections::HashSet;

use mailkit_history::CommandType;
use mailkit_template::{
    ColumnCoordinates, TemplateStore, add_column_with_redistribution, clamp_width,
    delete_column_with_redistribution, max_column_width, resize_column,
};
use proptest::prelude::*;
use support::{column, history, init_tracing, store_with_row, widths};

fn frozen_ids(store: &TemplateStore, indexes: &[usize]) -> HashSet<String> {
    indexes
        .iter()
        .map(|index| store.rows()[0].columns[*index].id.clone())
        .collect()
}

#[test]
fn limits_follow_the_column_count() {
    assert_eq!(max_column_width(1), 100);
    assert_eq!(max_column_width(4), 85);
    assert_eq!(clamp_width(2.0, 85), 5);
    assert_eq!(clamp_width(42.4, 85), 42);
    assert_eq!(clamp_width(42.5, 85), 43);
    assert_eq!(clamp_width(90.0, 85), 85);
    assert_eq!(clamp_width(f64::NAN, 85), 5);
}

#[test]
fn adding_a_column_takes_width_from_the_leftmost_widest() -> anyhow::Result<()> {
    let mut store = store_with_row(&[50, 50]);
    let mut history = history();

    let batch = add_column_with_redistribution(
        &store,
        ColumnCoordinates::new(0, 2),
        &column(0, Vec::new()),
        5,
        &HashSet::new(),
    )?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![45, 50, 5]);
    assert_eq!(history.timeline().len(), 1);

    history.undo(&mut store)?;
    assert_eq!(widths(&store, 0), vec![50, 50]);
    Ok(())
}

#[test]
fn deleting_a_column_spreads_its_width_with_the_remainder_first() -> anyhow::Result<()> {
    let mut store = store_with_row(&[25, 25, 25, 25]);
    let mut history = history();

    let batch = delete_column_with_redistribution(&store, ColumnCoordinates::new(0, 0), &HashSet::new())?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![34, 33, 33]);

    history.undo(&mut store)?;
    assert_eq!(widths(&store, 0), vec![25, 25, 25, 25]);
    Ok(())
}

#[test]
fn frozen_columns_neither_give_nor_take() -> anyhow::Result<()> {
    let mut store = store_with_row(&[40, 30, 30]);
    let mut history = history();
    let frozen = frozen_ids(&store, &[1]);

    let batch = delete_column_with_redistribution(&store, ColumnCoordinates::new(0, 0), &frozen)?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![30, 70]);

    let frozen = frozen_ids(&store, &[0]);
    let batch = add_column_with_redistribution(
        &store,
        ColumnCoordinates::new(0, 0),
        &column(0, Vec::new()),
        20,
        &frozen,
    )?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![20, 30, 50]);
    Ok(())
}

#[test]
fn infeasible_plans_return_none() -> anyhow::Result<()> {
    init_tracing();
    let store = store_with_row(&[95, 5]);

    let add = add_column_with_redistribution(
        &store,
        ColumnCoordinates::new(0, 1),
        &column(0, Vec::new()),
        95,
        &HashSet::new(),
    )?;
    assert!(add.is_none());

    let frozen = frozen_ids(&store, &[1]);
    let delete = delete_column_with_redistribution(&store, ColumnCoordinates::new(0, 0), &frozen)?;
    assert!(delete.is_none());

    let resize = resize_column(&store, ColumnCoordinates::new(0, 0), 60.0, &frozen)?;
    assert!(resize.is_none());
    Ok(())
}

#[test]
fn resize_is_clamped_by_the_sibling_minimum() -> anyhow::Result<()> {
    let mut store = store_with_row(&[50, 50]);
    let mut history = history();

    let batch = resize_column(&store, ColumnCoordinates::new(0, 0), 99.0, &HashSet::new())?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![95, 5]);

    assert!(resize_column(&store, ColumnCoordinates::new(0, 0), 97.0, &HashSet::new())?.is_none());

    history.undo(&mut store)?;
    assert_eq!(widths(&store, 0), vec![50, 50]);
    Ok(())
}

#[test]
fn resize_uses_the_widest_editable_sibling() -> anyhow::Result<()> {
    let mut store = store_with_row(&[40, 30, 30]);
    let mut history = history();
    let frozen = frozen_ids(&store, &[0]);

    let batch = resize_column(&store, ColumnCoordinates::new(0, 1), 50.0, &frozen)?;
    let Some(batch) = batch else {
        anyhow::bail!("expected a batch");
    };
    history.execute_command(&mut store, batch, CommandType::RowUpdate)?;
    assert_eq!(widths(&store, 0), vec![40, 50, 10]);
    Ok(())
}

fn row_widths() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..12, 2..=5).prop_map(|extras| {
        let mut widths: Vec<u32> = extras.iter().map(|extra| 5 + extra).collect();
        let sum: u32 = widths.iter().sum();
        widths[0] += 100 - sum;
        widths
    })
}

fn assert_valid(widths: &[u32]) -> Result<(), TestCaseError> {
    prop_assert_eq!(widths.iter().sum::<u32>(), 100);
    prop_assert!(widths.iter().all(|width| *width >= 5));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn add_keeps_the_row_at_full_width(initial in row_widths(), width in 5u32..40, slot in 0usize..6) {
        let mut store = store_with_row(&initial);
        let mut history = history();
        let index = slot % (initial.len() + 1);
        let spare: u32 = initial.iter().map(|width| width - 5).sum();

        let batch = add_column_with_redistribution(
            &store,
            ColumnCoordinates::new(0, index),
            &column(0, Vec::new()),
            width,
            &HashSet::new(),
        ).map_err(|err| TestCaseError::fail(err.to_string()))?;

        match batch {
            Some(batch) => {
                history.execute_command(&mut store, batch, CommandType::RowUpdate)
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                let after = widths(&store, 0);
                assert_valid(&after)?;
                prop_assert_eq!(after[index], width);
                history.undo(&mut store).map_err(|err| TestCaseError::fail(err.to_string()))?;
                prop_assert_eq!(widths(&store, 0), initial);
            }
            None => {
                prop_assert!(spare < width);
            }
        }
    }

    #[test]
    fn delete_keeps_the_row_at_full_width(initial in row_widths(), slot in 0usize..5) {
        let mut store = store_with_row(&initial);
        let mut history = history();
        let index = slot % initial.len();

        let batch = delete_column_with_redistribution(&store, ColumnCoordinates::new(0, index), &HashSet::new())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert!(batch.is_some());
        if let Some(batch) = batch {
            history.execute_command(&mut store, batch, CommandType::RowUpdate)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            let after = widths(&store, 0);
            prop_assert_eq!(after.len(), initial.len() - 1);
            assert_valid(&after)?;
        }
    }

    #[test]
    fn resize_keeps_the_row_at_full_width(initial in row_widths(), slot in 0usize..5, target in 0.0f64..120.0) {
        let mut store = store_with_row(&initial);
        let mut history = history();
        let index = slot % initial.len();

        let batch = resize_column(&store, ColumnCoordinates::new(0, index), target, &HashSet::new())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        if let Some(batch) = batch {
            history.execute_command(&mut store, batch, CommandType::RowUpdate)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            assert_valid(&widths(&store, 0))?;
        }
    }
}
