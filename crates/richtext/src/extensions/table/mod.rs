//! Tables: `table > tableRow > (tableCell | tableHeader) > block+`.

use serde_json::{Value, json};

use crate::core::Node;
use crate::extensions::{arg_f64, arg_i64, arg_str, outcome};
use crate::plugin::{CommandSpec, Extension, KeyBinding, NodeViewSpec};
use crate::schema::{AttrSpec, DomSpec, NodeSpec};
use crate::transforms::tables::{
    add_column, add_row, delete_column, delete_row, delete_table, go_to_next_cell, insert_table,
    set_cell_attribute, toggle_header_cell,
};

mod view;

pub use crate::transforms::table_widths::{
    DEFAULT_MIN_COLUMN_WIDTH_PERCENT, calculate_resized_widths, column_count, distribute_width_evenly,
    get_column_widths, normalize_widths,
};
pub use crate::transforms::tables::{CellContext, cell_context, is_table_cell};
pub use view::render_table_view;

const DEFAULT_ROWS: usize = 3;
const DEFAULT_COLS: usize = 3;

fn default_border() -> Value {
    json!({ "width": "1px", "style": "solid", "color": "#000000" })
}

fn table_element(node: &Node) -> DomSpec {
    let width = node.attr_str("tableWidth").unwrap_or("100%");
    DomSpec::element("table")
        .attr(
            "style",
            format!("width: {width}; table-layout: fixed; border-collapse: collapse; border-spacing: 0;"),
        )
        .attr("width", format!("{}%", width.replace('%', "")))
        .attr("cellpadding", "0")
        .attr("cellspacing", "0")
}

fn cell_dom(tag: &str, node: &Node) -> DomSpec {
    let mut dom = DomSpec::element(tag);
    let mut styles: Vec<String> = Vec::new();

    for span in ["colspan", "rowspan"] {
        let value = node.attr(span).and_then(Value::as_u64).unwrap_or(1);
        if value != 1 {
            dom = dom.attr(span, value.to_string());
        }
    }

    let widths: Vec<f64> = node
        .attr("colwidth")
        .and_then(Value::as_array)
        .map(|widths| widths.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    if !widths.is_empty() {
        let listed: Vec<String> = widths.iter().map(|w| format!("{w:.2}")).collect();
        let total: f64 = widths.iter().sum();
        dom = dom
            .attr("data-colwidth", listed.join(","))
            .attr("width", format!("{total:.2}%"));
        styles.push(format!("width: {total:.2}%"));
    }

    if let Some(background) = node.attr_str("backgroundColor").filter(|bg| !bg.is_empty()) {
        styles.push(format!("background-color: {background}"));
        dom = dom.attr("bgcolor", background);
    }

    let border = node
        .attr("border")
        .filter(|border| border.is_object())
        .cloned()
        .unwrap_or_else(default_border);
    let part = |key: &str, fallback: &str| {
        border
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    let border_value = format!(
        "{} {} {}",
        part("width", "1px"),
        part("style", "solid"),
        part("color", "#000000")
    );
    styles.push(format!("border: {border_value}"));
    dom = dom.attr("border", border_value);

    styles.extend(["position: relative", "vertical-align: top", "padding: 5px"].map(String::from));
    dom.attr("style", styles.join("; ")).child(DomSpec::Hole)
}

fn cell_spec(name: &'static str, tag: &'static str) -> NodeSpec {
    NodeSpec::new(name)
        .content("block+")
        .isolating()
        .attr("colspan", AttrSpec::new(1))
        .attr("rowspan", AttrSpec::new(1))
        .attr("colwidth", AttrSpec::null())
        .attr("backgroundColor", AttrSpec::null())
        .attr("border", AttrSpec::new(default_border()))
        .to_dom(move |node| cell_dom(tag, node))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Table;

impl Extension for Table {
    fn name(&self) -> &str {
        "table"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("table")
                .content("tableRow+")
                .group("block")
                .isolating()
                .attr("tableWidth", AttrSpec::new("100%"))
                .to_dom(|node| table_element(node).child(DomSpec::wrapping("tbody"))),
        ]
    }

    fn node_views(&self) -> Vec<NodeViewSpec> {
        vec![NodeViewSpec::new("table", render_table_view)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let table_nodes = ["table", "tableRow", "tableCell"];
        let min_width = |args: Option<&Value>| {
            arg_f64(args, "minWidth")
                .filter(|width| *width > 0.0)
                .unwrap_or(DEFAULT_MIN_COLUMN_WIDTH_PERCENT)
        };
        vec![
            CommandSpec::new("insertTable", |props, args| {
                let size = |key: &str, fallback: usize| {
                    args.and_then(|args| args.get(key))
                        .and_then(Value::as_u64)
                        .and_then(|n| usize::try_from(n).ok())
                        .unwrap_or(fallback)
                };
                let (rows, cols) = (size("rows", DEFAULT_ROWS), size("cols", DEFAULT_COLS));
                outcome("insertTable", insert_table(props.tr, rows, cols))
            })
            .requires_nodes(table_nodes)
            .args_example(json!({ "rows": 3, "cols": 3 })),
            CommandSpec::new("addRowBefore", |props, _| outcome("addRowBefore", add_row(props.tr, false)))
                .requires_nodes(table_nodes),
            CommandSpec::new("addRowAfter", |props, _| outcome("addRowAfter", add_row(props.tr, true)))
                .requires_nodes(table_nodes),
            CommandSpec::new("deleteRow", |props, _| outcome("deleteRow", delete_row(props.tr)))
                .requires_nodes(table_nodes),
            CommandSpec::new("addColumnBefore", move |props, args| {
                outcome("addColumnBefore", add_column(props.tr, false, min_width(args)))
            })
            .requires_nodes(table_nodes),
            CommandSpec::new("addColumnAfter", move |props, args| {
                outcome("addColumnAfter", add_column(props.tr, true, min_width(args)))
            })
            .requires_nodes(table_nodes)
            .args_example(json!({ "minWidth": 10 })),
            CommandSpec::new("deleteColumn", |props, _| outcome("deleteColumn", delete_column(props.tr)))
                .requires_nodes(table_nodes),
            CommandSpec::new("deleteTable", |props, _| outcome("deleteTable", delete_table(props.tr)))
                .requires_nodes(table_nodes),
            CommandSpec::new("setCellAttribute", |props, args| {
                let Some(name) = arg_str(args, "name") else {
                    return false;
                };
                let value = args
                    .and_then(|args| args.get("value"))
                    .cloned()
                    .unwrap_or(Value::Null);
                outcome("setCellAttribute", set_cell_attribute(props.tr, name, value))
            })
            .requires_nodes(table_nodes)
            .args_example(json!({ "name": "backgroundColor", "value": "#f5f5f5" })),
            CommandSpec::new("toggleHeaderCell", |props, _| {
                outcome("toggleHeaderCell", toggle_header_cell(props.tr))
            })
            .requires_nodes(["table", "tableRow", "tableCell", "tableHeader"]),
            CommandSpec::new("goToNextCell", |props, args| {
                let direction = arg_i64(args, "direction").unwrap_or(1);
                outcome("goToNextCell", go_to_next_cell(props.tr, if direction < 0 { -1 } else { 1 }))
            })
            .requires_nodes(table_nodes),
        ]
    }

    fn keymap(&self) -> Vec<KeyBinding> {
        vec![
            KeyBinding::new("Tab", |props| outcome("Tab", go_to_next_cell(props.tr, 1))),
            KeyBinding::new("Shift-Tab", |props| outcome("Shift-Tab", go_to_next_cell(props.tr, -1))),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableRow;

impl Extension for TableRow {
    fn name(&self) -> &str {
        "tableRow"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("tableRow")
                .content("(tableCell | tableHeader)*")
                .to_dom(|_| DomSpec::wrapping("tr")),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableCell;

impl Extension for TableCell {
    fn name(&self) -> &str {
        "tableCell"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![cell_spec("tableCell", "td")]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableHeader;

impl Extension for TableHeader {
    fn name(&self) -> &str {
        "tableHeader"
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        vec![cell_spec("tableHeader", "th")]
    }
}
