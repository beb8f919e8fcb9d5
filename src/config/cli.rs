use crate::domain::ports::ConfigProvider;
use crate::domain::settings::{
    default_allowed_hubs, ImageMode, LinkTemplates, OutputNames, PreviewFormat, PreviewRequest,
    DEFAULT_DESIGN_IMAGE_BASE_URL, DEFAULT_MB_IMAGE_BASE_URL,
};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "banner-etl")]
#[command(about = "Format KVI / Range / Dual MRP banner sheets and bundle product images")]
pub struct CliConfig {
    /// Banners workbook (.xlsx) with KVI, Range and Dual MRP tabs
    #[arg(long)]
    pub banners: String,

    /// Product CSV with 'MB_id' and 'image_src' columns
    #[arg(long)]
    pub product_csv: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Image bundles to build
    #[arg(long, value_enum, default_value_t = ImageMode::None)]
    pub images: ImageMode,

    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    /// Edge length of the square cut-out images
    #[arg(long, default_value = "650")]
    pub resize: u32,

    /// Colour distance (0-255) still treated as background
    #[arg(long, default_value = "40")]
    pub tolerance: u8,

    /// Only keep rows whose hub matches the allow-list
    #[arg(long)]
    pub hub_filter: bool,

    /// Override the hub allow-list (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub hubs: Vec<String>,

    #[arg(long, default_value = DEFAULT_MB_IMAGE_BASE_URL)]
    pub mb_image_base_url: String,

    #[arg(long, default_value = DEFAULT_DESIGN_IMAGE_BASE_URL)]
    pub design_image_base_url: String,

    /// Tab to print after processing (KVI, Range, Dual MRP, All_MbIDs)
    #[arg(long)]
    pub preview: Option<String>,

    #[arg(long, default_value = "20")]
    pub preview_rows: usize,

    #[arg(long, value_enum, default_value_t = PreviewFormat::Table)]
    pub preview_format: PreviewFormat,

    /// Print the preview and exit without writing outputs
    #[arg(long)]
    pub preview_only: bool,

    #[arg(long, help = "Log per-phase timing and memory")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn banners_path(&self) -> &str {
        &self.banners
    }

    fn product_csv_path(&self) -> Option<&str> {
        self.product_csv.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn image_mode(&self) -> ImageMode {
        self.images
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn resize_dimension(&self) -> u32 {
        self.resize
    }

    fn background_tolerance(&self) -> u8 {
        self.tolerance
    }

    fn link_templates(&self) -> LinkTemplates {
        LinkTemplates {
            mb_image_base_url: self.mb_image_base_url.clone(),
            design_image_base_url: self.design_image_base_url.clone(),
        }
    }

    fn output_names(&self) -> OutputNames {
        OutputNames::default()
    }

    fn hub_filter(&self) -> Option<Vec<String>> {
        if !self.hub_filter {
            return None;
        }
        if self.hubs.is_empty() {
            Some(default_allowed_hubs())
        } else {
            Some(self.hubs.clone())
        }
    }

    fn preview(&self) -> Option<PreviewRequest> {
        self.preview.as_ref().map(|tab| PreviewRequest {
            tab: tab.clone(),
            rows: self.preview_rows,
            format: self.preview_format,
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_file_extension("banners", &self.banners, &["xlsx", "xlsm", "xls", "ods"])?;
        if let Some(csv) = &self.product_csv {
            validate_file_extension("product_csv", csv, &["csv"])?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_range("resize", self.resize, 16, 4096)?;
        validate_url("mb_image_base_url", &self.mb_image_base_url)?;
        validate_url("design_image_base_url", &self.design_image_base_url)?;
        validate_positive_number("preview_rows", self.preview_rows as u64, 1)?;
        if self.preview_only && self.preview.is_none() {
            return Err(crate::utils::error::EtlError::MissingConfigError {
                field: "preview".to_string(),
            });
        }
        Ok(())
    }
}
