use crate::domain::model::{BannerKind, CellValue, RawSheet};
use crate::utils::error::Result;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// calamine trims leading blank columns off a range; pad them back so the
/// first column of every row is column A of the sheet.
fn sheet_from_range(name: &str, range: &Range<Data>) -> RawSheet {
    let lead = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let pad = |row: &[Data]| -> Vec<CellValue> {
        std::iter::repeat(CellValue::Empty)
            .take(lead)
            .chain(row.iter().map(to_cell))
            .collect()
    };

    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|r| pad(r).iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();

    RawSheet::new(name, header).with_rows(rows.map(pad).collect())
}

/// Reads every worksheet of an uploaded banners workbook. A sheet that
/// fails to parse only fails the read when it is a banner tab.
pub fn read_banner_workbook(bytes: Vec<u8>) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) if BannerKind::from_sheet_name(&name).is_none() => {
                tracing::warn!("⚠️ Skipping unreadable sheet '{}': {}", name, e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let sheet = sheet_from_range(&name, &range);
        tracing::debug!(
            "Read sheet '{}' ({} columns, {} rows)",
            name,
            sheet.header.len(),
            sheet.rows.len()
        );
        sheets.push(sheet);
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn sample_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let kvi = workbook.add_worksheet();
        kvi.set_name("KVI").unwrap();
        kvi.write_string(0, 0, " Hubs ").unwrap();
        kvi.write_string(0, 1, "MB ID 1").unwrap();
        kvi.write_string(1, 0, "ggn").unwrap();
        kvi.write_number(1, 1, 123.0).unwrap();

        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(2, 2, "offset").unwrap();
        notes.write_string(3, 2, "value").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_read_banner_workbook_reads_all_sheets_in_order() {
        let sheets = read_banner_workbook(sample_workbook()).unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["KVI", "Notes"]);

        let kvi = &sheets[0];
        assert_eq!(kvi.header, vec!["Hubs", "MB ID 1"]);
        assert_eq!(
            kvi.rows,
            vec![vec![CellValue::text("ggn"), CellValue::Number(123.0)]]
        );
    }

    #[test]
    fn test_leading_blank_columns_are_padded() {
        let sheets = read_banner_workbook(sample_workbook()).unwrap();
        let notes = &sheets[1];
        assert_eq!(notes.header, vec!["", "", "offset"]);
        assert_eq!(notes.rows[0][2], CellValue::text("value"));
        assert_eq!(notes.rows[0][0], CellValue::Empty);
    }

    /// Rebuilds the xlsx without the given part.
    fn drop_part(bytes: Vec<u8>, part: &str) -> Vec<u8> {
        use std::io::{Read, Write};
        use zip::write::{SimpleFileOptions, ZipWriter};

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = ZipWriter::new(Cursor::new(Vec::new()));
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            if file.name() == part {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            out.start_file(name, SimpleFileOptions::default()).unwrap();
            out.write_all(&content).unwrap();
        }
        out.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unreadable_non_banner_sheet_is_skipped() {
        let bytes = drop_part(sample_workbook(), "xl/worksheets/sheet2.xml");
        let sheets = read_banner_workbook(bytes).unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["KVI"]);
    }

    #[test]
    fn test_unreadable_banner_sheet_fails_the_read() {
        let bytes = drop_part(sample_workbook(), "xl/worksheets/sheet1.xml");
        assert!(read_banner_workbook(bytes).is_err());
    }

    #[test]
    fn test_rejects_non_workbook_bytes() {
        assert!(read_banner_workbook(b"hello".to_vec()).is_err());
    }
}
