use crate::adapters::bundle::ImageBundle;
use crate::adapters::{excel, preview, product_csv, xlsx_export};
use crate::core::banners::{collect_image_jobs, BannerTransformer};
use crate::core::imaging::{self, EdgeFloodRemover};
use crate::core::links::build_image_map;
use crate::core::{BackgroundRemover, ConfigProvider, Pipeline, Storage};
use crate::domain::model::{BannerWorkbook, BundleReport, ImageJob, LoadReport, RawInputs};
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, StatusCode};

pub struct BannerPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) client: Client,
    remover: Box<dyn BackgroundRemover>,
}

impl<S: Storage, C: ConfigProvider> BannerPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let remover = Box::new(EdgeFloodRemover::new(config.background_tolerance()));
        Self {
            storage,
            config,
            client: Client::new(),
            remover,
        }
    }

    /// 替換背景移除實作（例如接上外部模型）
    pub fn with_remover(mut self, remover: Box<dyn BackgroundRemover>) -> Self {
        self.remover = remover;
        self
    }

    async fn read_input(path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EtlError::InputNotFound {
                path: path.to_string(),
            },
            _ => EtlError::IoError(e),
        })
    }

    /// Best-effort download: any failure is logged and the item skipped.
    async fn fetch_image(&self, job: &ImageJob) -> Option<Vec<u8>> {
        let response = match self
            .client
            .get(&job.url)
            .timeout(self.config.request_timeout())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("⚠️ Skipping {}: request failed: {}", job.mb_id, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!(
                "⚠️ Skipping {}: {} returned {}",
                job.mb_id,
                job.url,
                response.status()
            );
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                tracing::warn!("⚠️ Skipping {}: body read failed: {}", job.mb_id, e);
                None
            }
        }
    }

    async fn build_bundles(
        &self,
        jobs: &[ImageJob],
    ) -> Result<(Option<ImageBundleResult>, Option<ImageBundleResult>)> {
        let mode = self.config.image_mode();
        let size = self.config.resize_dimension();
        let mut originals = mode.wants_original().then(ImageBundleResult::default);
        let mut cutouts = mode.wants_cutouts().then(ImageBundleResult::default);
        let total = jobs.len();

        for (index, job) in jobs.iter().enumerate() {
            tracing::info!("🖼️ [{}/{}] {}", index + 1, total, job.mb_id);

            let Some(bytes) = self.fetch_image(job).await else {
                for bundle in [originals.as_mut(), cutouts.as_mut()].into_iter().flatten() {
                    bundle.skipped += 1;
                }
                continue;
            };

            if let Some(bundle) = originals.as_mut() {
                match imaging::to_rgba_png(&bytes) {
                    Ok(png) => bundle.zip.add_png(&job.mb_id, &png)?,
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping {}: {}", job.mb_id, e);
                        bundle.skipped += 1;
                    }
                }
            }

            if let Some(bundle) = cutouts.as_mut() {
                match imaging::to_cutout_png(&bytes, size, self.remover.as_ref()) {
                    Ok(png) => bundle.zip.add_png(&job.mb_id, &png)?,
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping cut-out for {}: {}", job.mb_id, e);
                        bundle.skipped += 1;
                    }
                }
            }
        }

        Ok((originals, cutouts))
    }

    async fn store_bundle(&self, bundle: ImageBundleResult, name: &str) -> Result<BundleReport> {
        let written = bundle.zip.len();
        let skipped = bundle.skipped;
        let data = bundle.zip.finish()?;
        let path = self.storage.write_file(name, &data).await?;
        tracing::info!(
            "📦 {}: {} images written, {} skipped",
            name,
            written,
            skipped
        );
        Ok(BundleReport {
            path,
            written,
            skipped,
        })
    }
}

#[derive(Default)]
struct ImageBundleResult {
    zip: ImageBundle,
    skipped: usize,
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BannerPipeline<S, C> {
    async fn extract(&self) -> Result<RawInputs> {
        let banners_path = self.config.banners_path();
        tracing::info!("📥 Reading banners workbook: {}", banners_path);
        let sheets = excel::read_banner_workbook(Self::read_input(banners_path).await?)?;

        let products = match self.config.product_csv_path() {
            Some(path) => {
                tracing::info!("📥 Reading product CSV: {}", path);
                Some(product_csv::read_products(&Self::read_input(path).await?)?)
            }
            None => {
                tracing::info!("No product CSV given, image links will be blank");
                None
            }
        };

        Ok(RawInputs { sheets, products })
    }

    async fn transform(&self, inputs: RawInputs) -> Result<BannerWorkbook> {
        let image_map = build_image_map(inputs.products.as_deref().unwrap_or_default());
        tracing::info!("🔗 Image map holds {} MB IDs", image_map.len());

        let links = self.config.link_templates();
        let hubs = self.config.hub_filter();
        if let Some(allowed) = &hubs {
            tracing::info!("Hub filter on ({} allowed hubs)", allowed.len());
        }

        let transformer =
            BannerTransformer::new(&image_map, &links).with_hub_filter(hubs.as_deref());
        let tabs = transformer.process_sheets(&inputs.sheets);
        if tabs.is_empty() {
            return Err(EtlError::NoBannerTabsError {
                path: self.config.banners_path().to_string(),
            });
        }

        let all_mb_ids = transformer.build_all_mb_ids(&tabs);
        let image_jobs = collect_image_jobs(&tabs);
        tracing::info!(
            "✅ {} tabs, {} distinct MB IDs, {} images to fetch",
            tabs.len(),
            all_mb_ids.len(),
            image_jobs.len()
        );

        Ok(BannerWorkbook {
            tabs,
            all_mb_ids,
            image_jobs,
        })
    }

    async fn load(&self, workbook: BannerWorkbook) -> Result<LoadReport> {
        let names = self.config.output_names();

        let data = xlsx_export::render_workbook(&workbook)?;
        let workbook_path = self.storage.write_file(&names.workbook, &data).await?;
        tracing::info!("📁 Workbook saved to: {}", workbook_path);

        let mut report = LoadReport {
            workbook_path,
            images: None,
            cutouts: None,
        };

        let mode = self.config.image_mode();
        if !mode.wants_original() && !mode.wants_cutouts() {
            return Ok(report);
        }

        let (originals, cutouts) = self.build_bundles(&workbook.image_jobs).await?;
        if let Some(bundle) = originals {
            report.images = Some(self.store_bundle(bundle, &names.images_zip).await?);
        }
        if let Some(bundle) = cutouts {
            report.cutouts = Some(self.store_bundle(bundle, &names.cutouts_zip).await?);
        }

        Ok(report)
    }

    fn render_preview(&self, workbook: &BannerWorkbook) -> Result<Option<String>> {
        let Some(request) = self.config.preview() else {
            return Ok(None);
        };

        let table = workbook.table_by_name(&request.tab).ok_or_else(|| {
            EtlError::processing(format!(
                "Unknown preview tab '{}'. Available tabs: {}",
                request.tab,
                workbook.tab_names().join(", ")
            ))
        })?;

        preview::render(&table, &request).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::imaging::encode_png;
    use crate::domain::model::{BannerKind, CellValue, ProductRecord, RawSheet};
    use crate::domain::settings::{
        ImageMode, LinkTemplates, OutputNames, PreviewFormat, PreviewRequest,
    };
    use httpmock::prelude::*;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.files.lock().await.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(format!("mock://{}", path))
        }
    }

    struct MockConfig {
        images: ImageMode,
        links: LinkTemplates,
        preview: Option<PreviewRequest>,
        hubs: Option<Vec<String>>,
    }

    impl MockConfig {
        fn new(images: ImageMode) -> Self {
            Self {
                images,
                links: LinkTemplates::default(),
                preview: None,
                hubs: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn banners_path(&self) -> &str {
            "banners.xlsx"
        }

        fn product_csv_path(&self) -> Option<&str> {
            None
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn image_mode(&self) -> ImageMode {
            self.images
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(2)
        }

        fn resize_dimension(&self) -> u32 {
            32
        }

        fn background_tolerance(&self) -> u8 {
            30
        }

        fn link_templates(&self) -> LinkTemplates {
            self.links.clone()
        }

        fn output_names(&self) -> OutputNames {
            OutputNames::default()
        }

        fn hub_filter(&self) -> Option<Vec<String>> {
            self.hubs.clone()
        }

        fn preview(&self) -> Option<PreviewRequest> {
            self.preview.clone()
        }
    }

    fn inputs() -> RawInputs {
        let kvi = RawSheet::new(
            "KVI",
            vec!["Hubs".to_string(), "Product Name".to_string(), "MB ID 1".to_string()],
        )
        .with_rows(vec![
            vec![CellValue::text("ggn"), CellValue::text("Milk"), CellValue::Number(101.0)],
            vec![CellValue::text("pun"), CellValue::text("Curd"), CellValue::text("202")],
        ]);
        RawInputs {
            sheets: vec![kvi],
            products: Some(vec![
                ProductRecord {
                    mb_id: "101".to_string(),
                    image_src: "p/101.png".to_string(),
                },
                ProductRecord {
                    mb_id: "202".to_string(),
                    image_src: "p/202.png".to_string(),
                },
            ]),
        }
    }

    fn png(alpha: u8) -> Vec<u8> {
        encode_png(RgbaImage::from_fn(8, 8, |x, y| {
            if (2..6).contains(&x) && (2..6).contains(&y) {
                Rgba([200, 10, 10, 255])
            } else {
                Rgba([255, 255, 255, alpha])
            }
        }))
        .unwrap()
    }

    fn zip_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_transform_builds_tabs_and_jobs() {
        let pipeline = BannerPipeline::new(MockStorage::new(), MockConfig::new(ImageMode::None));

        let workbook = pipeline.transform(inputs()).await.unwrap();

        assert_eq!(workbook.tabs.len(), 1);
        assert_eq!(workbook.tabs[0].kind, BannerKind::Kvi);
        assert_eq!(workbook.all_mb_ids.len(), 2);
        assert_eq!(workbook.image_jobs.len(), 2);
        assert_eq!(
            workbook.image_jobs[0].url,
            "https://file.milkbasket.com/products/p/101.png"
        );
    }

    #[tokio::test]
    async fn test_transform_without_banner_tabs_fails() {
        let pipeline = BannerPipeline::new(MockStorage::new(), MockConfig::new(ImageMode::None));
        let raw = RawInputs {
            sheets: vec![RawSheet::new("Sheet1", vec!["Hubs".to_string()])],
            products: None,
        };

        let err = pipeline.transform(raw).await.unwrap_err();
        assert!(matches!(err, EtlError::NoBannerTabsError { .. }));
    }

    #[tokio::test]
    async fn test_transform_applies_hub_filter() {
        let mut config = MockConfig::new(ImageMode::None);
        config.hubs = Some(vec!["pun".to_string()]);
        let pipeline = BannerPipeline::new(MockStorage::new(), config);

        let workbook = pipeline.transform(inputs()).await.unwrap();
        assert_eq!(workbook.tabs[0].rows.len(), 1);
        assert_eq!(workbook.tabs[0].rows[0].mb_id_1, "202");
    }

    #[tokio::test]
    async fn test_load_without_images_writes_only_workbook() {
        let storage = MockStorage::new();
        let pipeline = BannerPipeline::new(storage.clone(), MockConfig::new(ImageMode::None));
        let workbook = pipeline.transform(inputs()).await.unwrap();

        let report = pipeline.load(workbook).await.unwrap();

        assert_eq!(report.workbook_path, "mock://Banners_MultiTab_Output.xlsx");
        assert!(report.images.is_none());
        assert!(report.cutouts.is_none());
        assert_eq!(
            storage.file_names().await,
            vec!["Banners_MultiTab_Output.xlsx"]
        );
    }

    #[tokio::test]
    async fn test_load_skips_failed_downloads() {
        let server = MockServer::start();
        let ok_mock = server.mock(|when, then| {
            when.method(GET).path("/products/p/101.png");
            then.status(200)
                .header("Content-Type", "image/png")
                .body(png(255));
        });
        let missing_mock = server.mock(|when, then| {
            when.method(GET).path("/products/p/202.png");
            then.status(404);
        });

        let storage = MockStorage::new();
        let mut config = MockConfig::new(ImageMode::All);
        config.links.mb_image_base_url = server.url("/products/");
        let pipeline = BannerPipeline::new(storage.clone(), config);

        let workbook = pipeline.transform(inputs()).await.unwrap();
        let report = pipeline.load(workbook).await.unwrap();

        // each URL is fetched once even though both bundles are built
        ok_mock.assert_hits(1);
        missing_mock.assert_hits(1);

        let images = report.images.unwrap();
        assert_eq!((images.written, images.skipped), (1, 1));
        let cutouts = report.cutouts.unwrap();
        assert_eq!((cutouts.written, cutouts.skipped), (1, 1));

        let zip = storage.get_file("Banner_Images.zip").await.unwrap();
        assert_eq!(zip_names(zip), vec!["101.png"]);

        let zip = storage.get_file("Banner_Images_rembg.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut archive.by_name("101.png").unwrap(), &mut bytes).unwrap();
        let cutout = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(cutout.dimensions(), (32, 32));
        assert_eq!(cutout.get_pixel(0, 0)[3], 0);
    }

    #[tokio::test]
    async fn test_undecodable_download_is_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/products/");
            then.status(200).body("<html>not an image</html>");
        });

        let storage = MockStorage::new();
        let mut config = MockConfig::new(ImageMode::Original);
        config.links.mb_image_base_url = server.url("/products/");
        let pipeline = BannerPipeline::new(storage.clone(), config);

        let workbook = pipeline.transform(inputs()).await.unwrap();
        let report = pipeline.load(workbook).await.unwrap();

        let images = report.images.unwrap();
        assert_eq!((images.written, images.skipped), (0, 2));
        assert!(report.cutouts.is_none());
        assert!(storage.get_file("Banner_Images_rembg.zip").await.is_none());
    }

    #[tokio::test]
    async fn test_render_preview() {
        let mut config = MockConfig::new(ImageMode::None);
        config.preview = Some(PreviewRequest {
            tab: "All_MbIDs".to_string(),
            rows: 10,
            format: PreviewFormat::Table,
        });
        let pipeline = BannerPipeline::new(MockStorage::new(), config);
        let workbook = pipeline.transform(inputs()).await.unwrap();

        let preview = pipeline.render_preview(&workbook).unwrap().unwrap();
        assert!(preview.starts_with("== All_MbIDs =="));
        assert!(preview.contains("(2 of 2 rows)"));
    }

    #[tokio::test]
    async fn test_render_preview_unknown_tab() {
        let mut config = MockConfig::new(ImageMode::None);
        config.preview = Some(PreviewRequest {
            tab: "Range".to_string(),
            rows: 10,
            format: PreviewFormat::Json,
        });
        let pipeline = BannerPipeline::new(MockStorage::new(), config);
        let workbook = pipeline.transform(inputs()).await.unwrap();

        let err = pipeline.render_preview(&workbook).unwrap_err();
        assert!(err.to_string().contains("KVI, All_MbIDs"));
    }
}
