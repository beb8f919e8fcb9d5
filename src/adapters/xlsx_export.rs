use crate::core::normalize::clean_sheet_name;
use crate::domain::model::{BannerWorkbook, CellValue, SheetTable};
use crate::utils::error::Result;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};

const HEADER_FILL: u32 = 0xFFFF99;
const MISSING_LINK_FILL: u32 = 0xFF6666;

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) if s.is_empty() => {}
        CellValue::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) if n.is_finite() => {
            sheet.write_number(row, col, *n)?;
        }
        CellValue::Number(_) => {}
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn write_banner_sheet(sheet: &mut Worksheet, table: &SheetTable, header: &Format) -> Result<()> {
    sheet.set_name(clean_sheet_name(&table.name))?;
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            write_cell(sheet, r as u32 + 1, col as u16, value)?;
        }
    }
    sheet.autofit();
    Ok(())
}

/// All_MbIDs: blank image links are painted red so the operator can chase them.
fn write_mb_id_sheet(sheet: &mut Worksheet, table: &SheetTable, missing: &Format) -> Result<()> {
    sheet.set_name(clean_sheet_name(&table.name))?;
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            write_cell(sheet, r, col as u16, value)?;
        }
        let link_missing = row.get(1).map(|c| c.to_string().trim().is_empty()).unwrap_or(true);
        if link_missing {
            sheet.write_blank(r, 1, missing)?;
        }
    }
    sheet.autofit();
    Ok(())
}

/// Renders the multi-tab output workbook: one sheet per banner tab followed
/// by `All_MbIDs`.
pub fn render_workbook(workbook: &BannerWorkbook) -> Result<Vec<u8>> {
    let header = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL));
    let missing = Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(MISSING_LINK_FILL));

    let mut book = Workbook::new();
    for tab in &workbook.tabs {
        write_banner_sheet(book.add_worksheet(), &tab.to_table(), &header)?;
    }
    write_mb_id_sheet(book.add_worksheet(), &workbook.all_mb_ids_table(), &missing)?;

    Ok(book.save_to_buffer()?)
}
