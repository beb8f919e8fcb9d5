use crate::domain::ports::ConfigProvider;
use crate::domain::settings::{
    default_allowed_hubs, ImageMode, LinkTemplates, OutputNames, PreviewFormat, PreviewRequest,
    DEFAULT_CUTOUTS_ZIP_NAME, DEFAULT_DESIGN_IMAGE_BASE_URL, DEFAULT_IMAGES_ZIP_NAME,
    DEFAULT_MB_IMAGE_BASE_URL, DEFAULT_PREVIEW_ROWS, DEFAULT_RESIZE, DEFAULT_TIMEOUT_SECONDS,
    DEFAULT_TOLERANCE, DEFAULT_WORKBOOK_NAME,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_file_name, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub links: LinksConfig,
    pub hubs: Option<HubsConfig>,
    pub preview: Option<PreviewConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub banners: String,
    pub product_csv: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub workbook_name: String,
    pub images_zip_name: String,
    pub cutouts_zip_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            workbook_name: DEFAULT_WORKBOOK_NAME.to_string(),
            images_zip_name: DEFAULT_IMAGES_ZIP_NAME.to_string(),
            cutouts_zip_name: DEFAULT_CUTOUTS_ZIP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub mode: ImageMode,
    pub timeout_seconds: u64,
    pub resize: u32,
    pub tolerance: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            mode: ImageMode::None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            resize: DEFAULT_RESIZE,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub mb_image_base_url: String,
    pub design_image_base_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            mb_image_base_url: DEFAULT_MB_IMAGE_BASE_URL.to_string(),
            design_image_base_url: DEFAULT_DESIGN_IMAGE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubsConfig {
    pub filter: bool,
    pub allowed: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub tab: String,
    pub rows: Option<usize>,
    pub format: Option<PreviewFormat>,
    pub only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BANNER_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn preview_only(&self) -> bool {
        self.preview
            .as_ref()
            .and_then(|p| p.only)
            .unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_file_extension(
            "input.banners",
            &self.input.banners,
            &["xlsx", "xlsm", "xls", "ods"],
        )?;
        if let Some(csv) = &self.input.product_csv {
            validate_file_extension("input.product_csv", csv, &["csv"])?;
        }

        validate_path("output.path", &self.output.path)?;
        validate_file_name("output.workbook_name", &self.output.workbook_name, "xlsx")?;
        validate_file_name("output.images_zip_name", &self.output.images_zip_name, "zip")?;
        validate_file_name("output.cutouts_zip_name", &self.output.cutouts_zip_name, "zip")?;

        validate_positive_number("images.timeout_seconds", self.images.timeout_seconds, 1)?;
        validate_range("images.resize", self.images.resize, 16, 4096)?;

        validate_url("links.mb_image_base_url", &self.links.mb_image_base_url)?;
        validate_url(
            "links.design_image_base_url",
            &self.links.design_image_base_url,
        )?;

        if let Some(preview) = &self.preview {
            if let Some(rows) = preview.rows {
                validate_positive_number("preview.rows", rows as u64, 1)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn banners_path(&self) -> &str {
        &self.input.banners
    }

    fn product_csv_path(&self) -> Option<&str> {
        self.input.product_csv.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn image_mode(&self) -> ImageMode {
        self.images.mode
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.images.timeout_seconds)
    }

    fn resize_dimension(&self) -> u32 {
        self.images.resize
    }

    fn background_tolerance(&self) -> u8 {
        self.images.tolerance
    }

    fn link_templates(&self) -> LinkTemplates {
        LinkTemplates {
            mb_image_base_url: self.links.mb_image_base_url.clone(),
            design_image_base_url: self.links.design_image_base_url.clone(),
        }
    }

    fn output_names(&self) -> OutputNames {
        OutputNames {
            workbook: self.output.workbook_name.clone(),
            images_zip: self.output.images_zip_name.clone(),
            cutouts_zip: self.output.cutouts_zip_name.clone(),
        }
    }

    fn hub_filter(&self) -> Option<Vec<String>> {
        let hubs = self.hubs.as_ref().filter(|h| h.filter)?;
        Some(hubs.allowed.clone().unwrap_or_else(default_allowed_hubs))
    }

    fn preview(&self) -> Option<PreviewRequest> {
        self.preview.as_ref().map(|p| PreviewRequest {
            tab: p.tab.clone(),
            rows: p.rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
            format: p.format.unwrap_or_default(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
