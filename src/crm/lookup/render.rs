use crate::crm::lookup::flatten::{Table, cell_text};

/// Widest a rendered column may get before cells are clipped.
pub const DEFAULT_MAX_WIDTH: usize = 40;

const COLUMN_GAP: &str = "  ";
const ELLIPSIS: &str = "...";

/// Renders the table as left-aligned text columns under a dashed rule.
pub fn render_table(table: &Table, max_width: usize) -> String {
    if table.columns().is_empty() {
        return String::new();
    }

    let max_width = max_width.max(ELLIPSIS.len() + 1);
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|cell| clip(&cell_text(cell), max_width)).collect())
        .collect();
    let headers: Vec<String> = table
        .columns()
        .iter()
        .map(|column| clip(column, max_width))
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            body.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .fold(header.chars().count(), usize::max)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &body {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join(COLUMN_GAP).trim_end());
    out.push('\n');
}

fn clip(text: &str, max_width: usize) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max_width {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_width - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}
