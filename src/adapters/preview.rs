use crate::domain::model::{CellValue, SheetTable};
use crate::domain::settings::{PreviewFormat, PreviewRequest};
use crate::utils::error::Result;
use serde::Serialize;

const MAX_COLUMN_WIDTH: usize = 40;

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_COLUMN_WIDTH {
        value.to_string()
    } else {
        let mut clipped: String = value.chars().take(MAX_COLUMN_WIDTH - 1).collect();
        clipped.push('…');
        clipped
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}

/// Plain-text grid with a row-count footer.
pub fn render_table(table: &SheetTable, max_rows: usize) -> String {
    let shown: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(max_rows)
        .map(|row| {
            (0..table.columns.len())
                .map(|i| clip(&row.get(i).map(CellValue::to_string).unwrap_or_default()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            shown
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(clip(name).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(shown.len() + 4);
    out.push(format!("== {} ==", table.name));
    out.push(line(table.columns.iter().map(|c| clip(c)).collect()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    let shown_count = shown.len();
    for row in shown {
        out.push(line(row));
    }
    out.push(format!("({} of {} rows)", shown_count, table.rows.len()));
    out.join("\n")
}

#[derive(Serialize)]
struct JsonPreview<'a> {
    tab: &'a str,
    columns: &'a [String],
    rows: &'a [Vec<CellValue>],
    total_rows: usize,
}

pub fn render_json(table: &SheetTable, max_rows: usize) -> Result<String> {
    let shown = table.rows.len().min(max_rows);
    let preview = JsonPreview {
        tab: &table.name,
        columns: &table.columns,
        rows: &table.rows[..shown],
        total_rows: table.rows.len(),
    };
    Ok(serde_json::to_string_pretty(&preview)?)
}

pub fn render(table: &SheetTable, request: &PreviewRequest) -> Result<String> {
    match request.format {
        PreviewFormat::Table => Ok(render_table(table, request.rows)),
        PreviewFormat::Json => render_json(table, request.rows),
    }
}
