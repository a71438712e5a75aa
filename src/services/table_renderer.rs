// src/services/table_renderer.rs
// DOCUMENTATION: Box-drawing text table renderer
// PURPOSE: Show flat metric maps the way the Striim console prints them

use crate::models::MetricMap;

/// Widest a column may get before its cells wrap
pub const MAX_COLUMN_WIDTH: usize = 30;

const NO_DATA: &str = "(no data)";

/// Render a header row and one data row
/// DOCUMENTATION: Deterministic, no I/O. Every line of the output has the same
/// character width.
pub fn render_table(metrics: &MetricMap) -> String {
    if metrics.is_empty() {
        return NO_DATA.to_string();
    }

    let columns: Vec<(Vec<String>, Vec<String>)> = metrics
        .iter()
        .map(|(name, value)| {
            (
                wrap_cell(name, MAX_COLUMN_WIDTH),
                wrap_cell(&MetricMap::display(value), MAX_COLUMN_WIDTH),
            )
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .map(|(header, data)| {
            header
                .iter()
                .chain(data.iter())
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_height = columns.iter().map(|(h, _)| h.len()).max().unwrap_or(1);
    let data_height = columns.iter().map(|(_, d)| d.len()).max().unwrap_or(1);

    let mut lines = Vec::with_capacity(header_height + data_height + 3);
    lines.push(border(&widths, '╒', '═', '╤', '╕'));
    for i in 0..header_height {
        lines.push(row(&widths, columns.iter().map(|(h, _)| h.get(i))));
    }
    lines.push(border(&widths, '├', '─', '┼', '┤'));
    for i in 0..data_height {
        lines.push(row(&widths, columns.iter().map(|(_, d)| d.get(i))));
    }
    lines.push(border(&widths, '└', '─', '┴', '┘'));

    lines.join("\n")
}

fn border(widths: &[usize], left: char, fill: char, joint: char, right: char) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("{}{}{}", left, segments.join(&joint.to_string()), right)
}

fn row<'a>(widths: &[usize], cells: impl Iterator<Item = Option<&'a String>>) -> String {
    let rendered: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| format!(" {:<width$} ", cell.map(String::as_str).unwrap_or(""), width = width))
        .collect();
    format!("│{}│", rendered.join("│"))
}

/// Split a cell into lines of at most `width` characters
/// DOCUMENTATION: Breaks at the last interior space, else right after the last
/// `$` or `_`, else hard at `width`.
pub fn wrap_cell(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > width {
        let window = &rest[..width];

        let (take, skip) = if let Some(pos) = window.iter().rposition(|c| *c == ' ').filter(|p| *p > 0) {
            (pos, 1)
        } else if let Some(pos) = window.iter().rposition(|c| *c == '$' || *c == '_') {
            (pos + 1, 0)
        } else {
            (width, 0)
        };

        lines.push(rest[..take].iter().collect::<String>().trim_end().to_string());
        rest.drain(..take + skip);
    }

    lines.push(rest.into_iter().collect());
    lines
}
