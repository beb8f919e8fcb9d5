use crate::core::Pipeline;
use crate::domain::model::{BannerWorkbook, LoadReport};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

/// What a run produced. `report` is `None` for preview-only runs.
#[derive(Debug)]
pub struct RunOutcome {
    pub workbook: BannerWorkbook,
    pub preview: Option<String>,
    pub report: Option<LoadReport>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
    preview_only: bool,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
            preview_only: false,
        }
    }

    /// 只預覽，不寫出任何檔案
    pub fn preview_only(mut self, preview_only: bool) -> Self {
        self.preview_only = preview_only;
        self
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting banner ETL");

        let inputs = self.pipeline.extract().await?;
        tracing::info!("Extracted {} sheets", inputs.sheets.len());
        self.monitor.finish_phase("extract");

        let workbook = self.pipeline.transform(inputs).await?;
        tracing::info!("Transformed {} banner rows", workbook.row_count());
        self.monitor.finish_phase("transform");

        let preview = self.pipeline.render_preview(&workbook)?;

        if self.preview_only {
            tracing::info!("🔍 Preview only, skipping load");
            self.monitor.log_final_stats();
            return Ok(RunOutcome {
                workbook,
                preview,
                report: None,
            });
        }

        let report = self.pipeline.load(workbook.clone()).await?;
        self.monitor.finish_phase("load");
        self.monitor.log_final_stats();

        Ok(RunOutcome {
            workbook,
            preview,
            report: Some(report),
        })
    }
}
