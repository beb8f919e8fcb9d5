use crate::domain::model::{BannerWorkbook, LoadReport, RawInputs};
use crate::domain::settings::{ImageMode, LinkTemplates, OutputNames, PreviewRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use image::RgbaImage;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn banners_path(&self) -> &str;
    fn product_csv_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn image_mode(&self) -> ImageMode;
    fn request_timeout(&self) -> Duration;
    fn resize_dimension(&self) -> u32;
    fn background_tolerance(&self) -> u8;
    fn link_templates(&self) -> LinkTemplates;
    fn output_names(&self) -> OutputNames;
    /// `Some(list)` only when hub filtering is switched on.
    fn hub_filter(&self) -> Option<Vec<String>>;
    fn preview(&self) -> Option<PreviewRequest>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawInputs>;
    async fn transform(&self, inputs: RawInputs) -> Result<BannerWorkbook>;
    async fn load(&self, workbook: BannerWorkbook) -> Result<LoadReport>;

    /// 預覽內容；沒有要求預覽時回傳 None
    fn render_preview(&self, _workbook: &BannerWorkbook) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Strips the background from an opaque product shot.
pub trait BackgroundRemover: Send + Sync {
    fn remove(&self, image: RgbaImage) -> RgbaImage;
}
