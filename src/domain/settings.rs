use serde::{Deserialize, Serialize};

pub const DEFAULT_MB_IMAGE_BASE_URL: &str = "https://file.milkbasket.com/products/";
pub const DEFAULT_DESIGN_IMAGE_BASE_URL: &str =
    "https://design-figma.s3.ap-south-1.amazonaws.com/";

pub const DEFAULT_WORKBOOK_NAME: &str = "Banners_MultiTab_Output.xlsx";
pub const DEFAULT_IMAGES_ZIP_NAME: &str = "Banner_Images.zip";
pub const DEFAULT_CUTOUTS_ZIP_NAME: &str = "Banner_Images_rembg.zip";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_RESIZE: u32 = 650;
pub const DEFAULT_TOLERANCE: u8 = 40;
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

pub const DEFAULT_ALLOWED_HUBS: &[&str] = &[
    "ggn",
    "jpr",
    "ahm",
    "ind",
    "mum",
    "pun",
    "blr",
    "hyd",
    "chn",
    "dlwss",
    "pbssnurpur",
    "krssdavanagere",
    "mgss",
    "west bengal",
    "vikaspuri & rp bagh",
    "nurpur & vr mall",
    "SS North",
    "SS South",
];

/// Which image bundles the load step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    #[default]
    None,
    Original,
    Rembg,
    All,
}

impl ImageMode {
    pub fn wants_original(&self) -> bool {
        matches!(self, ImageMode::Original | ImageMode::All)
    }

    pub fn wants_cutouts(&self) -> bool {
        matches!(self, ImageMode::Rembg | ImageMode::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    pub tab: String,
    pub rows: usize,
    pub format: PreviewFormat,
}

/// Base URLs the image links are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplates {
    pub mb_image_base_url: String,
    pub design_image_base_url: String,
}

impl Default for LinkTemplates {
    fn default() -> Self {
        Self {
            mb_image_base_url: DEFAULT_MB_IMAGE_BASE_URL.to_string(),
            design_image_base_url: DEFAULT_DESIGN_IMAGE_BASE_URL.to_string(),
        }
    }
}

/// Output file names inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub workbook: String,
    pub images_zip: String,
    pub cutouts_zip: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            workbook: DEFAULT_WORKBOOK_NAME.to_string(),
            images_zip: DEFAULT_IMAGES_ZIP_NAME.to_string(),
            cutouts_zip: DEFAULT_CUTOUTS_ZIP_NAME.to_string(),
        }
    }
}

pub fn default_allowed_hubs() -> Vec<String> {
    DEFAULT_ALLOWED_HUBS.iter().map(|h| h.to_string()).collect()
}
