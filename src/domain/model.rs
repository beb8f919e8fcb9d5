use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell as read from the banners workbook.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One worksheet of the uploaded banners workbook. `header` holds the first
/// row with every name trimmed; `rows` holds everything below it.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<CellValue>>) -> Self {
        self.rows = rows;
        self
    }
}

/// A row of the product lookup CSV, untouched apart from decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub mb_id: String,
    pub image_src: String,
}

/// Everything the extract step pulls off disk.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub sheets: Vec<RawSheet>,
    pub products: Option<Vec<ProductRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BannerKind {
    Kvi,
    Range,
    DualMrp,
}

const KVI_COLUMNS: &[&str] = &[
    "Hub",
    "Product Name",
    "MB ID 1",
    "Focused Sub Cat",
    "Img1",
    "Img2",
    "AmzId1",
    "AmzId2",
];

const PAIRED_COLUMNS: &[&str] = &[
    "Hub",
    "Product Name",
    "MB ID 1",
    "MB ID 2",
    "Focused Sub Cat",
    "Banner Call-Out",
    "Copy",
    "Img1",
    "Img2",
    "AmzId1",
    "AmzId2",
];

impl BannerKind {
    /// 依工作表名稱判斷橫幅類型（忽略大小寫與前後空白）
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "kvi" => Some(BannerKind::Kvi),
            "range" => Some(BannerKind::Range),
            "dual mrp" => Some(BannerKind::DualMrp),
            _ => None,
        }
    }

    pub fn tab_name(&self) -> &'static str {
        match self {
            BannerKind::Kvi => "KVI",
            BannerKind::Range => "Range",
            BannerKind::DualMrp => "Dual MRP",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            BannerKind::Kvi => KVI_COLUMNS,
            BannerKind::Range | BannerKind::DualMrp => PAIRED_COLUMNS,
        }
    }
}

impl fmt::Display for BannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tab_name())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BannerRow {
    pub hub: String,
    pub product_name: CellValue,
    pub mb_id_1: String,
    pub mb_id_2: String,
    pub sub_cat: CellValue,
    pub call_out: CellValue,
    pub img1: String,
    pub img2: String,
    pub amz_id_1: String,
    pub amz_id_2: String,
}

impl BannerRow {
    /// Cells in the column order of `kind.columns()`.
    pub fn cells(&self, kind: BannerKind) -> Vec<CellValue> {
        let hub = CellValue::from(self.hub.as_str());
        let links = [
            CellValue::from(self.img1.as_str()),
            CellValue::from(self.img2.as_str()),
            CellValue::from(self.amz_id_1.as_str()),
            CellValue::from(self.amz_id_2.as_str()),
        ];
        match kind {
            BannerKind::Kvi => {
                let mut cells = vec![
                    hub,
                    self.product_name.clone(),
                    CellValue::from(self.mb_id_1.as_str()),
                    self.sub_cat.clone(),
                ];
                cells.extend(links);
                cells
            }
            BannerKind::Range | BannerKind::DualMrp => {
                let mut cells = vec![
                    hub,
                    self.product_name.clone(),
                    CellValue::from(self.mb_id_1.as_str()),
                    CellValue::from(self.mb_id_2.as_str()),
                    self.sub_cat.clone(),
                    self.call_out.clone(),
                    // Copy is left blank for the operator to fill in
                    CellValue::Empty,
                ];
                cells.extend(links);
                cells
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerTab {
    pub kind: BannerKind,
    pub rows: Vec<BannerRow>,
}

impl BannerTab {
    pub fn to_table(&self) -> SheetTable {
        SheetTable {
            name: self.kind.tab_name().to_string(),
            columns: self.kind.columns().iter().map(|c| c.to_string()).collect(),
            rows: self.rows.iter().map(|r| r.cells(self.kind)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MbIdRow {
    #[serde(rename = "MB ID")]
    pub mb_id: String,
    #[serde(rename = "Image Link")]
    pub image_link: String,
}

pub const ALL_MB_IDS_TAB: &str = "All_MbIDs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub mb_id: String,
    pub url: String,
}

/// Result of the transform step: the derived tabs plus the download list.
#[derive(Debug, Clone, Default)]
pub struct BannerWorkbook {
    pub tabs: Vec<BannerTab>,
    pub all_mb_ids: Vec<MbIdRow>,
    pub image_jobs: Vec<ImageJob>,
}

impl BannerWorkbook {
    pub fn tab(&self, kind: BannerKind) -> Option<&BannerTab> {
        self.tabs.iter().find(|t| t.kind == kind)
    }

    pub fn all_mb_ids_table(&self) -> SheetTable {
        SheetTable {
            name: ALL_MB_IDS_TAB.to_string(),
            columns: vec!["MB ID".to_string(), "Image Link".to_string()],
            rows: self
                .all_mb_ids
                .iter()
                .map(|r| {
                    vec![
                        CellValue::from(r.mb_id.as_str()),
                        CellValue::from(r.image_link.as_str()),
                    ]
                })
                .collect(),
        }
    }

    /// 依名稱取得任一分頁（含 All_MbIDs），名稱比對忽略大小寫
    pub fn table_by_name(&self, name: &str) -> Option<SheetTable> {
        let wanted = name.trim();
        if wanted.eq_ignore_ascii_case(ALL_MB_IDS_TAB) {
            return Some(self.all_mb_ids_table());
        }
        BannerKind::from_sheet_name(wanted)
            .and_then(|kind| self.tab(kind))
            .map(BannerTab::to_table)
    }

    pub fn tab_names(&self) -> Vec<String> {
        self.tabs
            .iter()
            .map(|t| t.kind.tab_name().to_string())
            .chain(std::iter::once(ALL_MB_IDS_TAB.to_string()))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.tabs.iter().map(|t| t.rows.len()).sum()
    }
}

/// A named grid of cells, the common shape used by export and preview.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleReport {
    pub path: String,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub workbook_path: String,
    pub images: Option<BundleReport>,
    pub cutouts: Option<BundleReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_kind_from_sheet_name() {
        assert_eq!(BannerKind::from_sheet_name(" KVI "), Some(BannerKind::Kvi));
        assert_eq!(BannerKind::from_sheet_name("range"), Some(BannerKind::Range));
        assert_eq!(
            BannerKind::from_sheet_name("Dual MRP"),
            Some(BannerKind::DualMrp)
        );
        assert_eq!(BannerKind::from_sheet_name("DualMRP"), None);
        assert_eq!(BannerKind::from_sheet_name("Sheet1"), None);
    }

    #[test]
    fn test_cell_display_renders_integral_numbers_without_fraction() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::text("Atta").to_string(), "Atta");
    }

    #[test]
    fn test_paired_row_cells_follow_column_order() {
        let row = BannerRow {
            hub: "ggn".to_string(),
            product_name: CellValue::text("Milk"),
            mb_id_1: "1".to_string(),
            mb_id_2: "2".to_string(),
            img1: "http://img/1".to_string(),
            ..Default::default()
        };
        let cells = row.cells(BannerKind::Range);
        assert_eq!(cells.len(), BannerKind::Range.columns().len());
        assert_eq!(cells[3], CellValue::text("2"));
        assert_eq!(cells[6], CellValue::Empty);
        assert_eq!(cells[7], CellValue::text("http://img/1"));

        let kvi = row.cells(BannerKind::Kvi);
        assert_eq!(kvi.len(), BannerKind::Kvi.columns().len());
        assert_eq!(kvi[2], CellValue::text("1"));
    }

    #[test]
    fn test_table_by_name_includes_all_mb_ids() {
        let workbook = BannerWorkbook {
            tabs: vec![BannerTab {
                kind: BannerKind::Kvi,
                rows: vec![],
            }],
            all_mb_ids: vec![MbIdRow {
                mb_id: "7".to_string(),
                image_link: String::new(),
            }],
            image_jobs: vec![],
        };
        assert_eq!(workbook.tab_names(), vec!["KVI", "All_MbIDs"]);
        assert!(workbook.table_by_name("kvi").is_some());
        assert!(workbook.table_by_name("Range").is_none());
        let all = workbook.table_by_name("all_mbids").unwrap();
        assert_eq!(all.rows, vec![vec![CellValue::text("7"), CellValue::Empty]]);
    }
}
