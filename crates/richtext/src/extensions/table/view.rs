use crate::core::Node;
use crate::schema::DomSpec;
use crate::transforms::table_widths::{column_count, get_column_widths};

use super::table_element;

pub fn render_table_view(node: &Node) -> DomSpec {
    let count = column_count(node);
    let widths = get_column_widths(node);
    let mut colgroup = DomSpec::element("colgroup");
    for index in 0..count {
        let width = widths
            .get(index)
            .copied()
            .filter(|width| *width > 0.0)
            .unwrap_or(100.0 / count as f64);
        colgroup = colgroup.child(
            DomSpec::element("col")
                .attr("style", format!("width: {width}%"))
                .attr("width", format!("{width}%"))
                .attr("data-col-index", index.to_string()),
        );
    }
    let table = table_element(node)
        .attr("width", "100%")
        .child(colgroup)
        .child(DomSpec::wrapping("tbody"));
    DomSpec::element("div")
        .attr("style", "position: relative")
        .child(table)
}
