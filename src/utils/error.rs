use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Workbook read error: {0}")]
    WorkbookReadError(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    WorkbookWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    #[error("{source_name} must have columns {}", format_columns(.columns))]
    MissingColumnsError {
        source_name: String,
        columns: Vec<String>,
    },

    #[error("No KVI, Range or Dual MRP tab found in {path}")]
    NoBannerTabsError { path: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

fn format_columns(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(" and ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Output,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::CsvError(_)
            | EtlError::WorkbookReadError(_)
            | EtlError::InputNotFound { .. }
            | EtlError::MissingColumnsError { .. }
            | EtlError::NoBannerTabsError { .. } => ErrorCategory::Input,
            EtlError::HttpError(_) => ErrorCategory::Network,
            EtlError::ZipError(_)
            | EtlError::IoError(_)
            | EtlError::WorkbookWriteError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Output,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ImageError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// 行程結束代碼：1 輸入/設定/處理，2 網路，3 輸出
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::InputNotFound { path } => {
                format!("Check that '{}' exists and is readable", path)
            }
            EtlError::MissingColumnsError { .. } => {
                "Export the product CSV with the 'MB_id' and 'image_src' header names".to_string()
            }
            EtlError::NoBannerTabsError { .. } => {
                "Name the workbook tabs 'KVI', 'Range' or 'Dual MRP'".to_string()
            }
            EtlError::WorkbookReadError(_) => {
                "Make sure the banners file is a valid .xlsx workbook".to_string()
            }
            EtlError::CsvError(_) => "Make sure the product file is a valid CSV".to_string(),
            EtlError::HttpError(_) => "Check network connectivity and try again".to_string(),
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. }
            | EtlError::MissingConfigError { field } => {
                format!("Fix the '{}' setting and run again", field)
            }
            EtlError::IoError(_) | EtlError::ZipError(_) | EtlError::WorkbookWriteError(_) => {
                "Check that the output directory is writable and has free space".to_string()
            }
            EtlError::SerializationError(_)
            | EtlError::ImageError(_)
            | EtlError::ProcessingError { .. } => {
                "Run again with --verbose and inspect the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the input files: {}", self),
            ErrorCategory::Network => format!("A network request failed: {}", self),
            ErrorCategory::Output => format!("Could not write the outputs: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
