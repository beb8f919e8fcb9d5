//! Cleaning helpers shared by the banner transforms.

use crate::domain::model::CellValue;

/// Normalizes an MB ID cell so numeric IDs read from Excel (`123.0`) and
/// IDs typed as text (`" 0123 "`) key the same image.
pub fn clean_mb_id(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        CellValue::Number(n) => format_number_id(*n),
        CellValue::Text(s) => clean_mb_id_str(s),
    }
}

pub fn clean_mb_id_str(value: &str) -> String {
    let trimmed = value.trim();
    // 只有整數值才改寫，其餘保持原樣
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => format_number_id(n),
        _ => trimmed.to_string(),
    }
}

fn format_number_id(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_finite() && n.fract() == 0.0 {
        if n.abs() < i64::MAX as f64 {
            (n as i64).to_string()
        } else {
            format!("{:.0}", n)
        }
    } else {
        n.to_string()
    }
}

/// Empty or the literal `nan` left behind by spreadsheet exports.
pub fn is_missing_id(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id.eq_ignore_ascii_case("nan")
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first column whose name matches `name` once whitespace is
/// removed and case is folded (`"MB ID 1"` matches `"mbid1"`).
pub fn match_column<S: AsRef<str>>(columns: &[S], name: &str) -> Option<usize> {
    let wanted = squash(name);
    columns.iter().position(|c| squash(c.as_ref()) == wanted)
}

/// Excel rejects `[ ] * : / \ ?` in sheet names and caps them at 31 chars.
pub fn clean_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '*' | ':' | '/' | '\\' | '?'))
        .collect();
    cleaned.trim().chars().take(31).collect()
}

pub fn is_hub<S: AsRef<str>>(value: &str, allowed: &[S]) -> bool {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return false;
    }
    allowed
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .any(|h| !h.is_empty() && value.contains(&h))
}
