//! Integer column widths in percentage points. A row's columns always sum
//! to 100.

use std::collections::HashSet;

use crate::entity::ColumnEntity;

/// Smallest width any column may have.
pub const COLUMN_MIN_WIDTH: u32 = 5;
/// Increment used by width controls.
pub const COLUMN_WIDTH_STEP: u32 = 5;

/// New width for the column at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthUpdate {
    pub index: usize,
    pub new_width: u32,
}

/// Widest a single column can get while every other column keeps the
/// minimum. Four columns allow 85.
pub fn max_column_width(total_columns: usize) -> u32 {
    let others = u32::try_from(total_columns.saturating_sub(1)).unwrap_or(u32::MAX);
    100u32.saturating_sub(others.saturating_mul(COLUMN_MIN_WIDTH))
}

/// Rounds `width` and clamps it to `COLUMN_MIN_WIDTH..=max_width`.
pub fn clamp_width(width: f64, max_width: u32) -> u32 {
    let rounded = width.round();
    if rounded.is_nan() || rounded <= f64::from(COLUMN_MIN_WIDTH) {
        return COLUMN_MIN_WIDTH;
    }
    if rounded >= f64::from(max_width) {
        return max_width.max(COLUMN_MIN_WIDTH);
    }
    rounded as u32
}

fn editable_columns<'a>(
    columns: &'a [ColumnEntity],
    frozen: &HashSet<String>,
    exclude: Option<usize>,
) -> Vec<(usize, &'a ColumnEntity)> {
    columns
        .iter()
        .enumerate()
        .filter(|(index, column)| Some(*index) != exclude && !frozen.contains(&column.id))
        .collect()
}

/// The widest column other than `exclude` that is not frozen. Ties go to
/// the leftmost.
pub fn find_widest_editable_column<'a>(
    columns: &'a [ColumnEntity],
    exclude: usize,
    frozen: &HashSet<String>,
) -> Option<(usize, &'a ColumnEntity)> {
    let mut candidates = editable_columns(columns, frozen, Some(exclude));
    candidates.sort_by(|a, b| b.1.width.cmp(&a.1.width));
    candidates.into_iter().next()
}

/// Takes `needed` points from the editable columns, widest first, never
/// leaving one below the minimum. `None` when they cannot give enough.
pub fn collect_width_from_columns(
    columns: &[ColumnEntity],
    needed: u32,
    frozen: &HashSet<String>,
) -> Option<Vec<WidthUpdate>> {
    let mut donors: Vec<_> = editable_columns(columns, frozen, None)
        .into_iter()
        .filter(|(_, column)| column.width > COLUMN_MIN_WIDTH)
        .collect();
    donors.sort_by(|a, b| b.1.width.cmp(&a.1.width));

    let mut remaining = needed;
    let mut updates = Vec::new();
    for (index, column) in donors {
        if remaining == 0 {
            break;
        }
        let takes = (column.width - COLUMN_MIN_WIDTH).min(remaining);
        updates.push(WidthUpdate {
            index,
            new_width: column.width - takes,
        });
        remaining -= takes;
    }

    (remaining == 0).then_some(updates)
}

/// Spreads `width` over the editable columns other than `deleted_index`:
/// each gets `width / n` and the first `width % n` one more. Indexes in
/// the result already account for the deleted column being gone.
pub fn distribute_width_to_columns(
    columns: &[ColumnEntity],
    width: u32,
    deleted_index: usize,
    frozen: &HashSet<String>,
) -> Vec<WidthUpdate> {
    let recipients = editable_columns(columns, frozen, Some(deleted_index));
    if recipients.is_empty() {
        return Vec::new();
    }
    let count = u32::try_from(recipients.len()).unwrap_or(u32::MAX);
    let share = width / count;
    let remainder = width % count;

    recipients
        .into_iter()
        .enumerate()
        .map(|(nth, (index, column))| {
            let extra = u32::from((nth as u32) < remainder);
            WidthUpdate {
                index: if index > deleted_index { index - 1 } else { index },
                new_width: column.width + share + extra,
            }
        })
        .collect()
}
