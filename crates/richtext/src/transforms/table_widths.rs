//! Column width math for tables. Widths are percentages of the table
//! width and always add up to 100.

use serde_json::Value;

use crate::core::Node;

pub const DEFAULT_MIN_COLUMN_WIDTH_PERCENT: f64 = 5.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn colspan(cell: &Node) -> usize {
    cell.attr("colspan")
        .and_then(Value::as_u64)
        .and_then(|span| usize::try_from(span).ok())
        .filter(|span| *span > 0)
        .unwrap_or(1)
}

fn colwidth(cell: &Node) -> Vec<f64> {
    cell.attr("colwidth")
        .and_then(Value::as_array)
        .map(|widths| widths.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

pub fn column_count(table: &Node) -> usize {
    table
        .content
        .iter()
        .map(|row| row.content.iter().map(colspan).sum::<usize>())
        .max()
        .unwrap_or(0)
}

/// Scales `widths` to a total of 100, rounded to two decimals. Rounding
/// drift lands on the last column.
pub fn normalize_widths(widths: &[f64]) -> Vec<f64> {
    if widths.is_empty() {
        return Vec::new();
    }
    let total: f64 = widths.iter().sum();
    if total == 0.0 {
        let equal = 100.0 / widths.len() as f64;
        return vec![equal; widths.len()];
    }
    let mut rounded: Vec<f64> = widths.iter().map(|w| round2(w / total * 100.0)).collect();
    let sum: f64 = rounded.iter().sum();
    if let Some(last) = rounded.last_mut() {
        *last = round2(*last + (100.0 - sum));
    }
    rounded
}

/// Column widths read from the first row's `colwidth` attributes.
/// Columns without a width share whatever the others leave.
pub fn get_column_widths(table: &Node) -> Vec<f64> {
    let count = column_count(table);
    if count == 0 {
        return Vec::new();
    }
    let mut widths = vec![0.0; count];
    let mut found = vec![false; count];

    if let Some(first_row) = table.child(0) {
        let mut col = 0;
        for cell in &first_row.content {
            let span = colspan(cell);
            let declared = colwidth(cell);
            for offset in 0..span {
                let Some(width) = declared.get(offset) else {
                    continue;
                };
                if col + offset < count {
                    widths[col + offset] = *width;
                    found[col + offset] = *width > 0.0;
                }
            }
            col += span;
        }
    }

    let defined: f64 = widths.iter().sum();
    let missing = found.iter().filter(|f| !**f).count();
    if missing > 0 {
        let share = (100.0 - defined).max(0.0) / missing as f64;
        for (width, found) in widths.iter_mut().zip(&found) {
            if !found {
                *width = share;
            }
        }
    }

    let total: f64 = widths.iter().sum();
    if total == 0.0 || missing == count {
        return vec![100.0 / count as f64; count];
    }
    normalize_widths(&widths)
}

/// Equal widths for one more column, or `None` when that many columns
/// cannot all keep `min_width`.
pub fn distribute_width_evenly(current: &[f64], min_width: f64) -> Option<Vec<f64>> {
    let count = current.len() + 1;
    let max_columns = (100.0 / min_width).floor() as usize;
    if count > max_columns {
        return None;
    }
    Some(vec![100.0 / count as f64; count])
}

/// Moves `delta` percentage points from the right neighbour to the
/// column at `index`, keeping both at `min_width` or more.
pub fn calculate_resized_widths(current: &[f64], index: usize, delta: f64, min_width: f64) -> Vec<f64> {
    let neighbor = index + 1;
    if neighbor >= current.len() {
        return current.to_vec();
    }
    let width = current[index];
    let neighbor_width = current[neighbor];
    let max_delta = neighbor_width - min_width;
    let min_delta = -(width - min_width);
    let clamped = delta.min(max_delta).max(min_delta);
    if clamped.abs() < 0.01 {
        return current.to_vec();
    }
    let mut next = current.to_vec();
    next[index] = (width + clamped).max(min_width);
    next[neighbor] = (neighbor_width - clamped).max(min_width);
    normalize_widths(&next)
}
