use crate::core::links::ImageMap;
use crate::core::normalize::{clean_mb_id, is_hub, is_missing_id, match_column};
use crate::domain::model::{
    BannerKind, BannerRow, BannerTab, CellValue, ImageJob, MbIdRow, RawSheet,
};
use crate::domain::settings::LinkTemplates;
use std::collections::{BTreeSet, HashMap};

/// Column positions resolved once per sheet.
struct SheetColumns {
    product_name: Option<usize>,
    mb_id_1: Option<usize>,
    mb_id_2: Option<usize>,
    sub_cat: Option<usize>,
    call_out: Option<usize>,
}

impl SheetColumns {
    fn resolve(header: &[String]) -> Self {
        Self {
            product_name: match_column(header, "Product Name"),
            mb_id_1: match_column(header, "MB ID 1"),
            mb_id_2: match_column(header, "MB ID 2"),
            sub_cat: match_column(header, "Focused Sub Cat"),
            call_out: match_column(header, "Banner Call-Out"),
        }
    }
}

fn cell(row: &[CellValue], index: Option<usize>) -> CellValue {
    index
        .and_then(|i| row.get(i))
        .cloned()
        .unwrap_or_default()
}

fn hub_of(row: &[CellValue]) -> String {
    row.first()
        .map(|c| c.to_string().trim().to_string())
        .unwrap_or_default()
}

fn id_of(row: &[CellValue], index: Option<usize>) -> String {
    let id = clean_mb_id(&cell(row, index));
    if is_missing_id(&id) {
        String::new()
    } else {
        id
    }
}

/// Turns raw sheets into banner tabs and the derived lookup tables.
pub struct BannerTransformer<'a> {
    image_map: &'a ImageMap,
    links: &'a LinkTemplates,
    hub_filter: Option<&'a [String]>,
}

impl<'a> BannerTransformer<'a> {
    pub fn new(image_map: &'a ImageMap, links: &'a LinkTemplates) -> Self {
        Self {
            image_map,
            links,
            hub_filter: None,
        }
    }

    pub fn with_hub_filter(mut self, allowed: Option<&'a [String]>) -> Self {
        self.hub_filter = allowed;
        self
    }

    fn image_src(&self, mb_id: &str) -> &str {
        if mb_id.is_empty() {
            return "";
        }
        self.image_map.get(mb_id).unwrap_or("")
    }

    fn keep_hub(&self, hub: &str) -> bool {
        match self.hub_filter {
            Some(allowed) => is_hub(hub, allowed),
            None => true,
        }
    }

    pub fn process_kvi(&self, sheet: &RawSheet) -> Vec<BannerRow> {
        let columns = SheetColumns::resolve(&sheet.header);
        let mut out = Vec::new();

        for row in &sheet.rows {
            let hub = hub_of(row);
            if !self.keep_hub(&hub) {
                continue;
            }
            let mb_id_1 = id_of(row, columns.mb_id_1);
            if mb_id_1.is_empty() {
                continue;
            }

            let src = self.image_src(&mb_id_1);
            out.push(BannerRow {
                hub,
                product_name: cell(row, columns.product_name),
                sub_cat: cell(row, columns.sub_cat),
                img1: self.links.mb_image_link(src),
                amz_id_1: self.links.design_image_link(src),
                mb_id_1,
                ..Default::default()
            });
        }

        out
    }

    /// Range and Dual MRP share a layout; a row survives if either ID is set.
    pub fn process_paired(&self, sheet: &RawSheet) -> Vec<BannerRow> {
        let columns = SheetColumns::resolve(&sheet.header);
        let mut out = Vec::new();

        for row in &sheet.rows {
            let hub = hub_of(row);
            if !self.keep_hub(&hub) {
                continue;
            }
            let mb_id_1 = id_of(row, columns.mb_id_1);
            let mb_id_2 = id_of(row, columns.mb_id_2);
            if mb_id_1.is_empty() && mb_id_2.is_empty() {
                continue;
            }

            let src1 = self.image_src(&mb_id_1);
            let src2 = self.image_src(&mb_id_2);
            out.push(BannerRow {
                hub,
                product_name: cell(row, columns.product_name),
                sub_cat: cell(row, columns.sub_cat),
                call_out: cell(row, columns.call_out),
                img1: self.links.mb_image_link(src1),
                img2: self.links.mb_image_link(src2),
                amz_id_1: self.links.design_image_link(src1),
                amz_id_2: self.links.design_image_link(src2),
                mb_id_1,
                mb_id_2,
            });
        }

        out
    }

    /// 處理所有可辨識的工作表。同類型的工作表再次出現時，取代先前的內容但保留位置。
    pub fn process_sheets(&self, sheets: &[RawSheet]) -> Vec<BannerTab> {
        let mut tabs: Vec<BannerTab> = Vec::new();

        for sheet in sheets {
            let Some(kind) = BannerKind::from_sheet_name(&sheet.name) else {
                tracing::debug!("Ignoring sheet '{}'", sheet.name);
                continue;
            };

            let rows = match kind {
                BannerKind::Kvi => self.process_kvi(sheet),
                BannerKind::Range | BannerKind::DualMrp => self.process_paired(sheet),
            };
            tracing::info!(
                "📋 {} tab: {} of {} rows kept",
                kind,
                rows.len(),
                sheet.rows.len()
            );

            match tabs.iter_mut().find(|t| t.kind == kind) {
                Some(existing) => {
                    tracing::warn!("Sheet '{}' replaces an earlier {} tab", sheet.name, kind);
                    existing.rows = rows;
                }
                None => tabs.push(BannerTab { kind, rows }),
            }
        }

        tabs
    }

    /// Every distinct MB ID across the tabs, sorted as text.
    pub fn build_all_mb_ids(&self, tabs: &[BannerTab]) -> Vec<MbIdRow> {
        let ids: BTreeSet<&str> = tabs
            .iter()
            .flat_map(|t| t.rows.iter())
            .flat_map(|r| [r.mb_id_1.as_str(), r.mb_id_2.as_str()])
            .filter(|id| !is_missing_id(id))
            .collect();

        ids.into_iter()
            .map(|id| MbIdRow {
                mb_id: id.to_string(),
                image_link: self.links.mb_image_link(self.image_src(id)),
            })
            .collect()
    }
}

/// MB ID → image URL in first-seen order; a later link for the same ID
/// replaces the URL without moving the entry.
pub fn collect_image_jobs(tabs: &[BannerTab]) -> Vec<ImageJob> {
    let mut jobs: Vec<ImageJob> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in tabs.iter().flat_map(|t| t.rows.iter()) {
        for (mb_id, link) in [(&row.mb_id_1, &row.img1), (&row.mb_id_2, &row.img2)] {
            if mb_id.is_empty() || link.is_empty() {
                continue;
            }
            match positions.get(mb_id) {
                Some(&i) => jobs[i].url = link.clone(),
                None => {
                    positions.insert(mb_id.clone(), jobs.len());
                    jobs.push(ImageJob {
                        mb_id: mb_id.clone(),
                        url: link.clone(),
                    });
                }
            }
        }
    }

    jobs
}
